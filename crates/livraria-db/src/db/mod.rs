pub mod author;
pub mod category;
pub mod password_reset;
pub mod product;
pub mod publisher;
pub mod role;
pub mod transaction;
pub mod user;
