//! Multipart parsing for image-bearing entity endpoints.
//!
//! These endpoints take a JSON `payload` part plus an optional `file` part.
//! Anything else in the form is ignored.

use axum::extract::Multipart;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use livraria_core::models::UploadedImage;
use livraria_core::AppError;

const PAYLOAD_PART: &str = "payload";
const FILE_PART: &str = "file";

pub async fn parse_entity_multipart<T: DeserializeOwned>(
    mut multipart: Multipart,
) -> Result<(T, Option<UploadedImage>), AppError> {
    let mut payload: Option<T> = None;
    let mut file: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some(PAYLOAD_PART) => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read payload part: {}", e))
                })?;
                payload = Some(serde_json::from_str(&text).map_err(|e| {
                    AppError::InvalidInput(format!("Invalid payload JSON: {}", e))
                })?);
            }
            Some(FILE_PART) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data: Bytes = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file part: {}", e))
                })?;
                if !data.is_empty() {
                    file = Some(UploadedImage::new(data, content_type));
                }
            }
            _ => {}
        }
    }

    let payload = payload
        .ok_or_else(|| AppError::InvalidInput("Missing 'payload' part".to_string()))?;

    Ok((payload, file))
}
