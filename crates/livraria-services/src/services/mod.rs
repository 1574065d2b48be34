pub mod auth;
pub mod author;
pub mod category;
pub mod email;
pub mod product;
pub mod publisher;
pub mod rate_limit;
pub mod recovery;
pub mod user;

use livraria_core::AppError;
use validator::Validate;

/// Run `validator` constraints and collect every message into one
/// [`AppError::Validation`].
pub(crate) fn check_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        let mut violations: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        violations.sort();
        AppError::Validation(violations)
    })
}
