//! Value types for the image ingestion pipeline. None of these are persisted;
//! domain entities store only the resulting public URL string.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Logical category of an uploaded image's owner. Used to namespace remote
/// storage paths and synthetic filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Author,
    Product,
    User,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Author => "author",
            ResourceClass::Product => "product",
            ResourceClass::User => "user",
        }
    }
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient uploaded image: raw payload plus the client-declared MIME type
/// and byte size. Never persisted.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Bytes,
    pub content_type: String,
    pub size_bytes: usize,
}

impl UploadedImage {
    pub fn new(data: Bytes, content_type: impl Into<String>) -> Self {
        let size_bytes = data.len();
        Self {
            data,
            content_type: content_type.into(),
            size_bytes,
        }
    }
}

/// Outcome of validating an `UploadedImage`. Created fresh per validation
/// call and never mutated afterwards. When structural checks fail the image
/// is never decoded and the geometry fields stay zeroed.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub size_bytes: usize,
    pub content_type: String,
    pub violations: Vec<String>,
}
