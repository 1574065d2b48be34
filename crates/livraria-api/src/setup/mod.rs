//! Application setup and initialization, extracted from main.rs.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use livraria_core::Config;

use crate::state::AppState;

/// Initialize the entire application: telemetry, database, services, routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    telemetry::init_tracing();

    config
        .validate()
        .context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.server.environment,
        "Configuration loaded and validated"
    );

    let pool = database::setup_database(&config).await?;

    let state = services::initialize_services(&config, pool)?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
