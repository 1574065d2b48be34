//! Product endpoints. Create and update are multipart: a JSON `payload` part
//! plus an optional `file` part carrying the cover image.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use livraria_core::models::{CreateProductRequest, UpdateProductRequest};

use crate::error::{ApiResponse, HttpAppError};
use crate::handlers::parse_entity_multipart;
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    let products = state.products.list().await?;
    Ok(ApiResponse::ok(products))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let product = state.products.get(id).await?;
    Ok(ApiResponse::ok(product))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (request, image) =
        parse_entity_multipart::<CreateProductRequest>(multipart).await?;
    let product = state.products.create(request, image).await?;
    Ok(ApiResponse::created(product))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (request, image) =
        parse_entity_multipart::<UpdateProductRequest>(multipart).await?;
    let product = state.products.update(id, request, image).await?;
    Ok(ApiResponse::ok(product))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.products.delete(id).await?;
    Ok(ApiResponse::no_content("Product deleted"))
}
