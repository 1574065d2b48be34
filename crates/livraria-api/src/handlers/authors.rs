//! Author endpoints. Create and update are multipart: a JSON `payload` part
//! plus an optional `file` part carrying the portrait.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use livraria_core::models::{CreateAuthorRequest, UpdateAuthorRequest};

use crate::error::{ApiResponse, HttpAppError};
use crate::handlers::parse_entity_multipart;
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    let authors = state.authors.list().await?;
    Ok(ApiResponse::ok(authors))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let author = state.authors.get(id).await?;
    Ok(ApiResponse::ok(author))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (request, portrait) =
        parse_entity_multipart::<CreateAuthorRequest>(multipart).await?;
    let author = state.authors.create(request, portrait).await?;
    Ok(ApiResponse::created(author))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (request, portrait) =
        parse_entity_multipart::<UpdateAuthorRequest>(multipart).await?;
    let author = state.authors.update(id, request, portrait).await?;
    Ok(ApiResponse::ok(author))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.authors.delete(id).await?;
    Ok(ApiResponse::no_content("Author deleted"))
}
