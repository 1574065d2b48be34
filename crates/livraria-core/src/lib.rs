//! Core types shared across all Livraria crates: configuration, the unified
//! error taxonomy, domain models and ISBN validation.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use config::Config;
pub use error::{AppError, LogLevel};
