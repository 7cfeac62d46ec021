use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kyte_core::{PipelineResult, UploadResponse};

use crate::error::{log_error, status_for};
use crate::state::AppState;
use crate::utils::upload::extract_submission;

/// Upload image handler
///
/// Reads the multipart form and runs the submission through the ingestion
/// pipeline. Avatars additionally get a base64 placeholder in `blurpfp`
/// (empty string when derivation did not succeed).
///
/// # Errors
/// Every failure is answered with `{error}` and the status of the underlying
/// `AppError`:
/// - 400 for validation rejections and malformed forms
/// - 413 for files over the size ceiling
/// - 403/502 for provider rejections, 504 when the deadline expires
#[utoipa::path(
    post,
    path = "/api/images/upload",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Invalid input", body = UploadResponse),
        (status = 413, description = "File too large", body = UploadResponse),
        (status = 502, description = "Storage provider failure", body = UploadResponse),
        (status = 504, description = "Upload timed out", body = UploadResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let result = match extract_submission(multipart).await {
        Ok(submission) => state.pipeline.run(submission).await,
        Err(err) => {
            log_error(&err);
            PipelineResult::Failed(err)
        }
    };

    let status = result.error().map(status_for).unwrap_or(StatusCode::OK);
    (status, Json(result.to_response())).into_response()
}
