use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use livraria_core::models::{CreatePublisherRequest, UpdatePublisherRequest};

use crate::error::{ApiResponse, HttpAppError};
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    let publishers = state.publishers.list().await?;
    Ok(ApiResponse::ok(publishers))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let publisher = state.publishers.get(id).await?;
    Ok(ApiResponse::ok(publisher))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePublisherRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let publisher = state.publishers.create(request).await?;
    Ok(ApiResponse::created(publisher))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePublisherRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let publisher = state.publishers.update(id, request).await?;
    Ok(ApiResponse::ok(publisher))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.publishers.delete(id).await?;
    Ok(ApiResponse::no_content("Publisher deleted"))
}
