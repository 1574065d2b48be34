//! Route configuration.
//!
//! Reads are public. Catalog mutations require a valid JWT; user and role
//! administration additionally requires the admin role.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use livraria_core::Config;

use crate::handlers;
use crate::middleware::{auth_middleware, require_admin};
use crate::state::AppState;

// Multipart overhead on top of the raw image payload.
const BODY_LIMIT_SLACK_BYTES: usize = 512 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/google", post(handlers::auth::google_login))
        .route("/auth/recover", post(handlers::auth::recover))
        .route("/auth/reset", post(handlers::auth::reset))
        .route("/authors", get(handlers::authors::list))
        .route("/authors/{id}", get(handlers::authors::get))
        .route("/categories", get(handlers::categories::list))
        .route("/categories/{id}", get(handlers::categories::get))
        .route("/publishers", get(handlers::publishers::list))
        .route("/publishers/{id}", get(handlers::publishers::get))
        .route("/products", get(handlers::products::list))
        .route("/products/{id}", get(handlers::products::get));

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/authors", post(handlers::authors::create))
        .route("/authors/{id}", put(handlers::authors::update))
        .route("/authors/{id}", delete(handlers::authors::delete))
        .route("/categories", post(handlers::categories::create))
        .route("/categories/{id}", put(handlers::categories::update))
        .route("/categories/{id}", delete(handlers::categories::delete))
        .route("/publishers", post(handlers::publishers::create))
        .route("/publishers/{id}", put(handlers::publishers::update))
        .route("/publishers/{id}", delete(handlers::publishers::delete))
        .route("/products", post(handlers::products::create))
        .route("/products/{id}", put(handlers::products::update))
        .route("/products/{id}", delete(handlers::products::delete))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/users", get(handlers::users::list))
        .route("/users", post(handlers::users::create))
        .route("/users/{id}", get(handlers::users::get))
        .route("/users/{id}", put(handlers::users::update))
        .route("/users/{id}", delete(handlers::users::delete))
        .route("/roles", get(handlers::users::list_roles))
        .layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = public
        .merge(protected)
        .merge(admin)
        .layer(RequestBodyLimitLayer::new(
            config.image.max_file_size_bytes + BODY_LIMIT_SLACK_BYTES,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.server.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> = config
            .server
            .cors_origins
            .iter()
            .map(|o| o.parse())
            .collect();
        CorsLayer::new()
            .allow_origin(origins.map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?)
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
    };

    Ok(cors)
}
