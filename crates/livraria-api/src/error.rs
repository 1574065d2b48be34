//! HTTP error rendering.
//!
//! Every response, success or failure, carries the fixed shape
//! `{ "status": u16, "message": String, "data": ... }`. Failures map through
//! `AppError`'s own status/message methods; validation failures additionally
//! carry the full violation list in `data`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use livraria_core::{AppError, LogLevel};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                status: 200,
                message: "OK".to_string(),
                data: Some(data),
            }),
        )
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                status: 201,
                message: "Created".to_string(),
                data: Some(data),
            }),
        )
    }
}

impl ApiResponse<Value> {
    pub fn no_content(message: &str) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                status: 200,
                message: message.to_string(),
                data: None,
            }),
        )
    }
}

/// Wrapper so `IntoResponse` can be implemented for the core error type
/// (orphan rules).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

fn log_error(error: &AppError) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = error.error_code(), "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = error.error_code(), "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = error.error_code(), "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;
        log_error(error);

        let status_code = error.http_status_code();
        let status =
            StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Validation failures expose every violation; nothing else puts
        // internals into `data`.
        let data = match error {
            AppError::Validation(violations) => Some(json!({ "violations": violations })),
            _ => None,
        };

        let body = ApiResponse {
            status: status_code,
            message: error.client_message(),
            data,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_shape_has_status_message_data() {
        let (_, Json(body)) = ApiResponse::ok(json!({"id": 1}));
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["status"], 200);
        assert_eq!(value["message"], "OK");
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn validation_error_carries_violations() {
        let err = HttpAppError(AppError::Validation(vec![
            "too large".to_string(),
            "bad type".to_string(),
        ]));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn transaction_error_hides_internals() {
        let err = AppError::Transaction("authors step failed: connection reset".to_string());
        assert_eq!(err.client_message(), "Update failed");
        let response = HttpAppError(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_maps_to_bad_gateway() {
        let response =
            HttpAppError(AppError::Upstream("image upload failed".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
