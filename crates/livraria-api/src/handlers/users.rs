//! User administration endpoints. All of these sit behind the admin
//! middleware; update is multipart so the avatar can travel with the payload.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use livraria_core::models::{CreateUserRequest, UpdateUserRequest};

use crate::error::{ApiResponse, HttpAppError};
use crate::handlers::parse_entity_multipart;
use crate::state::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HttpAppError> {
    let users = state.users.list().await?;
    Ok(ApiResponse::ok(users))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state.users.get(id).await?;
    Ok(ApiResponse::ok(user))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state.users.create(request).await?;
    Ok(ApiResponse::created(user))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (request, avatar) = parse_entity_multipart::<UpdateUserRequest>(multipart).await?;
    let user = state.users.update(id, request, avatar).await?;
    Ok(ApiResponse::ok(user))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.users.delete(id).await?;
    Ok(ApiResponse::no_content("User deleted"))
}

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let roles = state.users.list_roles().await?;
    Ok(ApiResponse::ok(roles))
}
