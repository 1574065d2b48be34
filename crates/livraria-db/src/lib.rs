//! Database repositories for the data access layer.
//!
//! Each repository owns the SQL for one domain entity. Multi-step writes that
//! must be atomic go through `transaction::with_transaction`; repositories
//! expose `*_tx` variants taking the open transaction for those steps.

pub mod db;

pub use db::author::AuthorRepository;
pub use db::category::CategoryRepository;
pub use db::password_reset::{PasswordReset, PasswordResetRepository};
pub use db::product::{ProductColumns, ProductRepository};
pub use db::publisher::PublisherRepository;
pub use db::role::RoleRepository;
pub use db::transaction::with_transaction;
pub use db::user::UserRepository;
