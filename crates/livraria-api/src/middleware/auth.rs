//! JWT authentication and role checks.
//!
//! `auth_middleware` verifies the bearer token and stashes the claims in the
//! request extensions; `require_admin` layers on top of it for the
//! administration routes. Handlers read the claims through the `CurrentUser`
//! extractor.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use livraria_core::AppError;
use livraria_services::Claims;

use crate::error::HttpAppError;
use crate::state::AppState;

const ADMIN_ROLE: &str = "ADMIN";

/// Authenticated caller, available after `auth_middleware` has run.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Authentication required".to_string(),
                ))
            })
    }
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing or malformed Authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let claims = match state.auth.verify_token(token) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    request.extensions_mut().insert(CurrentUser(claims));
    next.run(request).await
}

/// Layered inside `auth_middleware`; rejects callers without the admin role.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .map(|user| user.0.roles.iter().any(|r| r == ADMIN_ROLE))
        .unwrap_or(false);

    if !is_admin {
        return HttpAppError(AppError::Forbidden(
            "Administrator role required".to_string(),
        ))
        .into_response();
    }

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
