use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kyte_core::{PlaceholderRequest, PlaceholderResponse};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ValidatedJson;
use crate::state::AppState;

const URL_REQUIRED: &str = "Image URL is required";
const PROCESSING_TIMEOUT: &str = "Image processing timeout";

/// Error body of `POST /api/images/createblurpfp`.
///
/// `success` is only present on processing failures (500).
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceholderErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(PlaceholderErrorResponse {
            success: None,
            error: message.into(),
        }),
    )
        .into_response()
}

fn processing_failed(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(PlaceholderErrorResponse {
            success: Some(false),
            error: message.into(),
        }),
    )
        .into_response()
}

/// Generate a tiny base64 JPEG placeholder for a publicly reachable image.
///
/// This is the service the ingestion pipeline calls for avatars when
/// `PLACEHOLDER_ENDPOINT` points at another instance.
#[utoipa::path(
    post,
    path = "/api/images/createblurpfp",
    tag = "images",
    request_body = PlaceholderRequest,
    responses(
        (status = 200, description = "Placeholder generated", body = PlaceholderResponse),
        (status = 400, description = "Missing or disallowed image URL", body = PlaceholderErrorResponse),
        (status = 500, description = "Fetch or processing failed", body = PlaceholderErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "create_placeholder"))]
pub async fn create_placeholder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<PlaceholderRequest>,
) -> Response {
    if request.validate().is_err() {
        return bad_request(URL_REQUIRED);
    }
    let image_url = match request.imageurl.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return bad_request(URL_REQUIRED),
    };

    if let Err(reason) = state.source_guard.check(&image_url).await {
        tracing::warn!(reason = %reason, "Placeholder source rejected");
        return bad_request(reason);
    }

    let generator = state.placeholder_generator.clone();
    match tokio::time::timeout(state.config.derive_timeout, generator.derive(&image_url)).await {
        Ok(Ok(blurpfp)) => {
            tracing::debug!(len = blurpfp.len(), "Placeholder generated");
            (
                StatusCode::OK,
                Json(PlaceholderResponse {
                    success: true,
                    blurpfp,
                }),
            )
                .into_response()
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, generator = generator.name(), "Placeholder generation failed");
            processing_failed(err.to_string())
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = state.config.derive_timeout.as_millis() as u64,
                "Placeholder generation timed out"
            );
            processing_failed(PROCESSING_TIMEOUT)
        }
    }
}
