//! Application setup and initialization
//!
//! Builds the image store, the placeholder derivers and the ingestion pipeline
//! from `Config`, then wires the router.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use kyte_core::Config;
use kyte_infra::LogFormat;
use kyte_processing::{create_deriver, InlinePlaceholderDeriver, PlaceholderDeriver};
use kyte_storage::create_store;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    let log_format: LogFormat = config.log_format.parse().unwrap_or_default();
    kyte_infra::init_telemetry("kyte-api", config.environment(), log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        account = %config.credentials.account_hint(),
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let state = Arc::new(build_state(config)?);
    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}

/// Construct the store, derivers and pipeline without touching global state.
pub fn build_state(config: Config) -> Result<AppState> {
    let store = create_store(&config).context("Failed to initialize image store")?;
    tracing::info!(provider = store.provider_name(), "Image store ready");

    let deriver = create_deriver(&config).context("Failed to initialize placeholder deriver")?;

    // The placeholder route always generates in-process; it is what a remote
    // PLACEHOLDER_ENDPOINT would be pointing at.
    let placeholder_generator: Arc<dyn PlaceholderDeriver> = Arc::new(
        InlinePlaceholderDeriver::new(config.placeholder_width, config.max_file_size_bytes)
            .context("Failed to initialize placeholder generator")?,
    );

    Ok(AppState::new(config, store, deriver, placeholder_generator))
}
