use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use livraria_core::models::{CreateCategoryRequest, UpdateCategoryRequest};

use crate::error::{ApiResponse, HttpAppError};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    let categories = state.categories.list().await?;
    Ok(ApiResponse::ok(categories))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let category = state.categories.get(id).await?;
    Ok(ApiResponse::ok(category))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let category = state.categories.create(request).await?;
    Ok(ApiResponse::created(category))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let category = state.categories.update(id, request).await?;
    Ok(ApiResponse::ok(category))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.categories.delete(id).await?;
    Ok(ApiResponse::no_content("Category deleted"))
}
