//! Cloudflare Images storage implementation
//!
//! Uses the direct-creator-upload flow: a one-time upload URL is requested
//! with the account credentials, then the image is posted to that URL as a
//! multipart form.

use async_trait::async_trait;
use chrono::Utc;
use kyte_core::{AssetSubmission, ProviderCredentials, StoredAsset, UploadTarget};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::traits::{ImageStore, StorageError, StorageResult};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const ACQUIRE_PERMISSION_HINT: &str =
    "Cloudflare Images permission denied - check the API token permissions";
const TRANSMIT_PERMISSION_HINT: &str =
    "Cloudflare Images permission denied - check the domain and API configuration";
const TRANSMIT_FALLBACK_MESSAGE: &str = "upload failed";

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct DirectUploadResult {
    #[serde(rename = "uploadURL")]
    upload_url: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    id: Option<String>,
    #[serde(default)]
    variants: Vec<String>,
}

impl<T> ApiEnvelope<T> {
    fn first_error(&self) -> Option<&str> {
        self.errors
            .iter()
            .map(|e| e.message.trim())
            .find(|m| !m.is_empty())
    }

    fn first_error_code(&self) -> Option<i64> {
        self.errors.first().and_then(|e| e.code)
    }
}

/// Cloudflare Images client.
pub struct CloudflareImageStore {
    client: Client,
    credentials: ProviderCredentials,
    require_signed_urls: bool,
    source_tag: String,
}

impl CloudflareImageStore {
    /// Create a client; fails with `ConfigMissing` when credentials are empty.
    pub fn new(
        credentials: ProviderCredentials,
        require_signed_urls: bool,
        source_tag: impl Into<String>,
    ) -> StorageResult<Self> {
        check_credentials(&credentials)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Transport(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            account = %credentials.account_hint(),
            api_base = %credentials.api_base,
            "Cloudflare Images client initialized"
        );

        Ok(Self {
            client,
            credentials,
            require_signed_urls,
            source_tag: source_tag.into(),
        })
    }

    fn direct_upload_url(&self) -> String {
        format!(
            "{}/accounts/{}/images/v2/direct_upload",
            self.credentials.api_base, self.credentials.account_id
        )
    }
}

fn check_credentials(credentials: &ProviderCredentials) -> StorageResult<()> {
    match credentials.missing_variable() {
        Some(var) => Err(StorageError::ConfigMissing(var.to_string())),
        None => Ok(()),
    }
}

fn transport(context: &str, err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Transport(format!("{}: timed out", context))
    } else {
        StorageError::Transport(format!("{}: {}", context, err))
    }
}

#[async_trait]
impl ImageStore for CloudflareImageStore {
    async fn request_upload_target(&self) -> StorageResult<UploadTarget> {
        check_credentials(&self.credentials)?;

        let metadata = serde_json::json!({
            "source": self.source_tag,
            "timestamp": Utc::now().timestamp_millis().to_string(),
        });
        let form = Form::new()
            .text("requireSignedURLs", self.require_signed_urls.to_string())
            .text("metadata", metadata.to_string());

        tracing::debug!(
            account = %self.credentials.account_hint(),
            "Requesting direct upload URL"
        );

        let response = self
            .client
            .post(self.direct_upload_url())
            .bearer_auth(&self.credentials.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport("direct upload request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport("reading direct upload response failed", e))?;
        let envelope = serde_json::from_str::<ApiEnvelope<DirectUploadResult>>(&body).ok();

        if status == StatusCode::FORBIDDEN {
            tracing::warn!(
                status = status.as_u16(),
                provider_error = ?envelope.as_ref().and_then(|e| e.first_error()),
                "Cloudflare refused direct upload request"
            );
            return Err(StorageError::ProviderRejected {
                status: Some(status.as_u16()),
                message: ACQUIRE_PERMISSION_HINT.to_string(),
            });
        }

        let envelope = match envelope {
            Some(envelope) if status.is_success() && envelope.success => envelope,
            other => {
                let detail = other
                    .as_ref()
                    .and_then(|e| e.first_error())
                    .unwrap_or("Unknown error")
                    .to_string();
                tracing::warn!(
                    status = status.as_u16(),
                    code = ?other.as_ref().and_then(|e| e.first_error_code()),
                    error = %detail,
                    "Cloudflare direct upload request failed"
                );
                return Err(StorageError::ProviderRejected {
                    status: Some(status.as_u16()),
                    message: format!("Cloudflare API Error: {}", detail),
                });
            }
        };

        let result = envelope.result.ok_or_else(|| StorageError::ProviderRejected {
            status: Some(status.as_u16()),
            message: "Cloudflare API Error: missing upload URL".to_string(),
        })?;
        let upload_url = result
            .upload_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| StorageError::ProviderRejected {
                status: Some(status.as_u16()),
                message: "Cloudflare API Error: missing upload URL".to_string(),
            })?;

        let reference = result.id.unwrap_or_default();
        tracing::debug!(reference = %reference, "Direct upload URL issued");

        Ok(UploadTarget::new(upload_url, reference))
    }

    async fn transmit(
        &self,
        target: UploadTarget,
        submission: &AssetSubmission,
    ) -> StorageResult<StoredAsset> {
        check_credentials(&self.credentials)?;

        let (target_url, reference) = target.into_parts();

        // `Bytes` clones share the buffer; the payload is not copied.
        let file_part =
            Part::stream_with_length(submission.data.clone(), submission.byte_len() as u64)
                .file_name(submission.filename.clone())
                .mime_str(&submission.essence())
                .map_err(|e| {
                    StorageError::Transport(format!("failed to build upload body: {}", e))
                })?;
        let metadata = serde_json::json!({
            "filename": submission.filename,
            "source": self.source_tag,
            "uploadTime": Utc::now().to_rfc3339(),
        });
        let form = Form::new()
            .part("file", file_part)
            .text("metadata", metadata.to_string());

        tracing::debug!(
            reference = %reference,
            size = submission.byte_len(),
            content_type = %submission.essence(),
            "Transmitting image to Cloudflare"
        );

        let response = self
            .client
            .post(&target_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport("upload request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport("reading upload response failed", e))?;

        if status == StatusCode::FORBIDDEN {
            tracing::warn!(status = status.as_u16(), "Cloudflare refused upload");
            return Err(StorageError::ProviderRejected {
                status: Some(status.as_u16()),
                message: TRANSMIT_PERMISSION_HINT.to_string(),
            });
        }

        let envelope = match serde_json::from_str::<ApiEnvelope<ImageResult>>(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(StorageError::MalformedResponse(format!(
                    "upload response is not valid JSON: {}",
                    e
                )));
            }
            Err(_) => {
                return Err(StorageError::ProviderRejected {
                    status: Some(status.as_u16()),
                    message: TRANSMIT_FALLBACK_MESSAGE.to_string(),
                });
            }
        };

        if !envelope.success {
            let message = envelope
                .first_error()
                .unwrap_or(TRANSMIT_FALLBACK_MESSAGE)
                .to_string();
            tracing::warn!(
                status = status.as_u16(),
                code = ?envelope.first_error_code(),
                error = %message,
                "Cloudflare upload failed"
            );
            return Err(StorageError::ProviderRejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let result = envelope.result.ok_or_else(|| {
            StorageError::MalformedResponse("upload response has no result".to_string())
        })?;
        let id = result
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or(reference);

        let stored = StoredAsset::from_variants(id, result.variants).ok_or_else(|| {
            StorageError::MalformedResponse("upload response has no image variants".to_string())
        })?;

        tracing::info!(
            reference = %stored.reference(),
            public_url = %stored.public_url(),
            "Image stored"
        );

        Ok(stored)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
