//! Placeholder derivation
//!
//! A deriver turns the public URL of a stored image into an encoded
//! placeholder. Derivation is best-effort: the pipeline absorbs every error
//! returned here.

use async_trait::async_trait;
use kyte_core::Config;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Derivation endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Derivation failed: {0}")]
    Rejected(String),

    #[error("Malformed derivation response: {0}")]
    Malformed(String),

    #[error("Derivation returned an empty payload")]
    EmptyPayload,

    #[error("Source image too large: {size} bytes (max: {max} bytes)")]
    SourceTooLarge { size: usize, max: usize },

    #[error("Placeholder generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Produces an encoded placeholder for a publicly reachable image.
#[async_trait]
pub trait PlaceholderDeriver: Send + Sync {
    async fn derive(&self, public_url: &str) -> Result<String, DeriveError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

fn build_client(redirects: Policy) -> Result<Client, DeriveError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(redirects)
        .build()
        .map_err(|e| DeriveError::Config(format!("failed to build HTTP client: {}", e)))
}

#[derive(Debug, Serialize)]
struct DeriveRequest<'a> {
    imageurl: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeriveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    blurpfp: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Calls a remote derivation endpoint: `POST {imageurl}` -> `{success, blurpfp}`.
pub struct HttpPlaceholderDeriver {
    client: Client,
    endpoint: String,
}

impl HttpPlaceholderDeriver {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DeriveError> {
        Ok(Self {
            client: build_client(Policy::default())?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PlaceholderDeriver for HttpPlaceholderDeriver {
    async fn derive(&self, public_url: &str) -> Result<String, DeriveError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DeriveRequest {
                imageurl: public_url,
            })
            .send()
            .await
            .map_err(|e| DeriveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeriveError::Status(status.as_u16()));
        }

        let body: DeriveResponse = response
            .json()
            .await
            .map_err(|e| DeriveError::Malformed(e.to_string()))?;

        if !body.success {
            return Err(DeriveError::Rejected(
                body.error.unwrap_or_else(|| "success=false".to_string()),
            ));
        }

        match body.blurpfp {
            Some(payload) if !payload.is_empty() => Ok(payload),
            _ => Err(DeriveError::EmptyPayload),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Fetches the image and generates the placeholder in-process.
///
/// Redirects are not followed: the caller vets only the URL it was given, so
/// a 3xx answer is reported as `DeriveError::Status`.
#[cfg(feature = "image")]
pub struct InlinePlaceholderDeriver {
    client: Client,
    width: u32,
    max_source_bytes: usize,
}

#[cfg(feature = "image")]
impl InlinePlaceholderDeriver {
    pub fn new(width: u32, max_source_bytes: usize) -> Result<Self, DeriveError> {
        Ok(Self {
            client: build_client(Policy::none())?,
            width,
            max_source_bytes,
        })
    }
}

#[cfg(feature = "image")]
#[async_trait]
impl PlaceholderDeriver for InlinePlaceholderDeriver {
    async fn derive(&self, public_url: &str) -> Result<String, DeriveError> {
        let response = self
            .client
            .get(public_url)
            .send()
            .await
            .map_err(|e| DeriveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeriveError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_source_bytes {
                return Err(DeriveError::SourceTooLarge {
                    size: len as usize,
                    max: self.max_source_bytes,
                });
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DeriveError::Transport(e.to_string()))?;
        if bytes.len() > self.max_source_bytes {
            return Err(DeriveError::SourceTooLarge {
                size: bytes.len(),
                max: self.max_source_bytes,
            });
        }

        let width = self.width;
        let encoded = tokio::task::spawn_blocking(move || {
            crate::placeholder::generate_placeholder(&bytes, width)
        })
        .await
        .map_err(|e| DeriveError::Generation(format!("placeholder task failed: {}", e)))?
        .map_err(|e| DeriveError::Generation(e.to_string()))?;

        if encoded.is_empty() {
            return Err(DeriveError::EmptyPayload);
        }
        Ok(encoded)
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

/// Build the deriver selected by configuration: remote when
/// `PLACEHOLDER_ENDPOINT` is set, in-process otherwise.
pub fn create_deriver(config: &Config) -> Result<Arc<dyn PlaceholderDeriver>, DeriveError> {
    if let Some(endpoint) = &config.placeholder_endpoint {
        tracing::info!(endpoint = %endpoint, "Using remote placeholder deriver");
        return Ok(Arc::new(HttpPlaceholderDeriver::new(endpoint.clone())?));
    }

    #[cfg(feature = "image")]
    {
        tracing::info!(
            width = config.placeholder_width,
            "Using in-process placeholder deriver"
        );
        Ok(Arc::new(InlinePlaceholderDeriver::new(
            config.placeholder_width,
            config.max_file_size_bytes,
        )?))
    }

    #[cfg(not(feature = "image"))]
    {
        Err(DeriveError::Config(
            "PLACEHOLDER_ENDPOINT must be set when the image feature is disabled".to_string(),
        ))
    }
}
