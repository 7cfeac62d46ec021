//! Route configuration and setup

use crate::constants::{
    HEALTH_PATH, MULTIPART_OVERHEAD_BYTES, OPENAPI_PATH, PLACEHOLDER_PATH, UPLOAD_PATH,
    UPLOAD_URL_PATH,
};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use kyte_core::Config;
use kyte_infra::request_id_middleware;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let mut app = build_router(state).layer(cors);

    if let Some(limit) = config.max_concurrent_uploads {
        tracing::info!(limit, "HTTP concurrency limit layer enabled");
        app = app.layer(ConcurrencyLimitLayer::new(limit));
    }

    Ok(app)
}

/// Routes plus the layers every deployment carries: body limit, tracing and
/// request ids. CORS and the optional concurrency limit come from
/// `setup_routes`.
pub fn build_router(state: Arc<AppState>) -> Router<()> {
    // The file ceiling itself is enforced by the validator so oversize
    // uploads get the usual `{error: "file too large"}` body; this limit only
    // stops unbounded bodies.
    let body_limit = state
        .config
        .max_file_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(UPLOAD_PATH, post(handlers::upload::upload_image))
        .route(UPLOAD_URL_PATH, get(handlers::upload_url::get_upload_url))
        .route(
            PLACEHOLDER_PATH,
            post(handlers::placeholder::create_placeholder),
        )
        .route(HEALTH_PATH, get(handlers::health::liveness_check))
        .route(
            OPENAPI_PATH,
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
