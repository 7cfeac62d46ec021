use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kyte_core::{AppError, ErrorMetadata, UploadUrlResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::log_error;
use crate::state::AppState;

/// Error body of `GET /api/images/getuploadurl`; `uploadURL` is always null.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadUrlErrorResponse {
    pub error: String,
    #[serde(rename = "uploadURL")]
    pub upload_url: Option<String>,
}

/// Issue a one-time direct upload URL so the client can send bytes to the
/// provider itself.
#[utoipa::path(
    get,
    path = "/api/images/getuploadurl",
    tag = "images",
    responses(
        (status = 200, description = "Upload URL issued", body = UploadUrlResponse),
        (status = 403, description = "Provider refused the credentials", body = UploadUrlErrorResponse),
        (status = 500, description = "Provider call failed", body = UploadUrlErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_upload_url"))]
pub async fn get_upload_url(State(state): State<Arc<AppState>>) -> Response {
    let outcome = tokio::time::timeout(
        state.config.pipeline_deadline,
        state.store.request_upload_target(),
    )
    .await;

    let error = match outcome {
        Ok(Ok(target)) => {
            let (upload_url, id) = target.into_parts();
            tracing::info!(id = %id, "Issued direct upload URL");
            return (StatusCode::OK, Json(UploadUrlResponse { upload_url, id })).into_response();
        }
        Ok(Err(err)) => AppError::from(err),
        Err(_) => AppError::Timeout("acquiring".to_string()),
    };

    log_error(&error);
    // Clients only distinguish a permission failure from everything else.
    let status = if error.http_status_code() == 403 {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(UploadUrlErrorResponse {
            error: error.client_message(),
            upload_url: None,
        }),
    )
        .into_response()
}
