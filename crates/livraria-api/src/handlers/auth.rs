//! Authentication endpoints: local login, Google sign-in and password
//! recovery. All public; recovery is rate limited per email inside the
//! service.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiResponse, HttpAppError};
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let authenticated = state.auth.login(&request.email, &request.password).await?;
    Ok(ApiResponse::ok(authenticated))
}

pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let authenticated = state.auth.google_login(&request.id_token).await?;
    Ok(ApiResponse::ok(authenticated))
}

pub async fn recover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecoverRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.recovery.request_reset(&request.email).await?;
    // Same response whether or not the account exists.
    Ok(ApiResponse::no_content(
        "If the account exists, a recovery email has been sent",
    ))
}

/// The caller's own account, resolved from the verified token.
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(claims): CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state.users.get(claims.sub).await?;
    Ok(ApiResponse::ok(user))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .recovery
        .reset_password(&request.token, &request.new_password)
        .await?;
    Ok(ApiResponse::no_content("Password updated"))
}
