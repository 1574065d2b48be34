//! Image validator
//!
//! Two-phase validation. Structural checks (size, MIME type, non-empty
//! payload) run first and never decode; if any fails the result comes back
//! immediately with zeroed geometry. Only when the structure is sound is the
//! payload decoded, after which every geometric check runs and all violations
//! are collected.

use std::io::Cursor;

use image::GenericImageView;
use image::ImageReader;

use livraria_core::config::ImageConfig;
use livraria_core::models::{UploadedImage, ValidationResult};

pub struct ImageValidator {
    rules: ImageConfig,
}

impl ImageValidator {
    pub fn new(rules: ImageConfig) -> Self {
        Self { rules }
    }

    /// Structural checks only — the fast pre-check variant. No decoding.
    pub fn check_structure(&self, image: &UploadedImage) -> Result<(), Vec<String>> {
        let violations = self.structural_violations(image);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn structural_violations(&self, image: &UploadedImage) -> Vec<String> {
        let mut violations = Vec::new();

        if image.data.is_empty() {
            violations.push("Image payload is empty".to_string());
        }

        if image.size_bytes > self.rules.max_file_size_bytes {
            violations.push(format!(
                "File too large: {} bytes (max: {} bytes)",
                image.size_bytes, self.rules.max_file_size_bytes
            ));
        }

        let content_type = image.content_type.to_lowercase();
        if !self.rules.allowed_content_types.contains(&content_type) {
            violations.push(format!(
                "Invalid content type: {} (allowed: {})",
                image.content_type,
                self.rules.allowed_content_types.join(", ")
            ));
        }

        violations
    }

    /// Full validation: structural checks, then decode, then geometric checks.
    /// Decoding failure is reported as a violation, never as an error.
    pub fn validate(&self, image: &UploadedImage) -> ValidationResult {
        let mut violations = self.structural_violations(image);

        // Structurally invalid images are never decoded.
        if !violations.is_empty() {
            return ValidationResult {
                is_valid: false,
                width: 0,
                height: 0,
                aspect_ratio: 0.0,
                size_bytes: image.size_bytes,
                content_type: image.content_type.clone(),
                violations,
            };
        }

        let decoded = ImageReader::new(Cursor::new(image.data.as_ref()))
            .with_guessed_format()
            .map_err(anyhow::Error::from)
            .and_then(|reader| reader.decode().map_err(anyhow::Error::from));

        let (width, height) = match decoded {
            Ok(img) => img.dimensions(),
            Err(e) => {
                tracing::debug!(error = %e, "Image decode failed during validation");
                violations.push(format!("Image could not be decoded: {}", e));
                return ValidationResult {
                    is_valid: false,
                    width: 0,
                    height: 0,
                    aspect_ratio: 0.0,
                    size_bytes: image.size_bytes,
                    content_type: image.content_type.clone(),
                    violations,
                };
            }
        };

        // Geometric checks, all collected.
        if width < self.rules.min_width || width > self.rules.max_width {
            violations.push(format!(
                "Width {} out of bounds ({}..={})",
                width, self.rules.min_width, self.rules.max_width
            ));
        }

        if height < self.rules.min_height || height > self.rules.max_height {
            violations.push(format!(
                "Height {} out of bounds ({}..={})",
                height, self.rules.min_height, self.rules.max_height
            ));
        }

        let aspect_ratio = if height > 0 {
            width as f64 / height as f64
        } else {
            0.0
        };
        if aspect_ratio < self.rules.min_aspect_ratio || aspect_ratio > self.rules.max_aspect_ratio
        {
            violations.push(format!(
                "Aspect ratio {:.3} out of bounds ({:.3}..={:.3})",
                aspect_ratio, self.rules.min_aspect_ratio, self.rules.max_aspect_ratio
            ));
        }

        // Guards against extreme non-square dimensions whose axes individually
        // pass the width/height checks.
        let max_pixels = self.rules.max_width as u64 * self.rules.max_height as u64;
        let pixels = width as u64 * height as u64;
        if pixels > max_pixels {
            violations.push(format!(
                "Pixel count {} exceeds maximum {}",
                pixels, max_pixels
            ));
        }

        ValidationResult {
            is_valid: violations.is_empty(),
            width,
            height,
            aspect_ratio,
            size_bytes: image.size_bytes,
            content_type: image.content_type.clone(),
            violations,
        }
    }
}
