//! Multipart extraction for the upload route

use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use kyte_core::{AppError, AssetSubmission};

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Parse the `isAvatar` form value: `true/false/1/0`, case-insensitive.
pub fn parse_avatar_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(AppError::InvalidInput(
            "isAvatar must be true or false".to_string(),
        )),
    }
}

fn read_error(context: &str, status: StatusCode, body: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("file too large".to_string())
    } else {
        AppError::InvalidInput(format!("{}: {}", context, body))
    }
}

/// Extract the submission from the upload form.
/// Exactly one field named "file" is accepted; `isAvatar` is optional.
pub async fn extract_submission(mut multipart: Multipart) -> Result<AssetSubmission, AppError> {
    let mut file: Option<(Bytes, String, String)> = None;
    let mut is_avatar = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error("Failed to read multipart", e.status(), e.body_text()))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    ));
                }
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let content_type = field
                    .content_type()
                    .map(|s| normalize_mime_type(s).to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let data = field.bytes().await.map_err(|e| {
                    read_error("Failed to read file data", e.status(), e.body_text())
                })?;

                file = Some((data, filename, content_type));
            }
            "isAvatar" => {
                let raw = field.text().await.map_err(|e| {
                    read_error("Failed to read isAvatar", e.status(), e.body_text())
                })?;
                is_avatar = parse_avatar_flag(&raw)?;
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(AssetSubmission::new(data, content_type, filename, is_avatar))
}
