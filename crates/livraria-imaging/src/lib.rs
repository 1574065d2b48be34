//! Image validation and transformation.
//!
//! Validation collects every violation instead of short-circuiting, so a
//! caller sees all problems at once. Transformation downsizes to a configured
//! longer-axis cap and re-encodes to JPEG at a fixed quality.

pub mod transformer;
pub mod validator;

pub use transformer::ImageTransformer;
pub use validator::ImageValidator;
