//! Business service layer.
//!
//! Services orchestrate repositories, the image pipeline and outbound
//! integrations. Keep coordination and domain rules here; keep thin HTTP
//! handling in livraria-api.

pub mod services;

pub use services::author::AuthorService;
pub use services::auth::{AuthService, AuthenticatedUser, Claims};
pub use services::category::CategoryService;
pub use services::email::{EmailService, MailTransport, SmtpMailTransport};
pub use services::product::ProductService;
pub use services::publisher::PublisherService;
pub use services::rate_limit::RequestRateLimiter;
pub use services::recovery::PasswordRecoveryService;
pub use services::user::UserService;
