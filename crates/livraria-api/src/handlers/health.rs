use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::error::{ApiResponse, HttpAppError};
use crate::state::AppState;

pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(livraria_core::AppError::from)?;

    Ok(ApiResponse::ok(json!({ "status": "healthy" })))
}
