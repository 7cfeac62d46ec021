//! Storage abstraction trait
//!
//! This module defines the `ImageStore` trait that every image storage
//! provider must implement.

use async_trait::async_trait;
use kyte_core::{AppError, AssetSubmission, StoredAsset, UploadTarget};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Account id or token is not configured.
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    /// The provider answered but refused the request.
    #[error("Provider rejected request: {message}")]
    ProviderRejected {
        status: Option<u16>,
        message: String,
    },

    /// The provider could not be reached or the connection broke mid-request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider reported success but the body was unusable.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigMissing(msg) => AppError::ConfigMissing(msg),
            StorageError::ProviderRejected { status, message } => {
                AppError::ProviderRejected { status, message }
            }
            StorageError::Transport(msg) => AppError::Transport(msg),
            StorageError::MalformedResponse(msg) => AppError::MalformedResponse(msg),
        }
    }
}

/// Image storage abstraction
///
/// Implementations hold only immutable state (credentials and an HTTP
/// connection pool) so a single instance can be shared across requests
/// behind an `Arc`.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Ask the provider for a fresh one-time upload target.
    ///
    /// Every call yields a distinct target; targets are never cached.
    async fn request_upload_target(&self) -> StorageResult<UploadTarget>;

    /// Send the submission to `target` and return the stored asset.
    ///
    /// A `StoredAsset` is returned only when the provider confirmed the upload
    /// and reported at least one public URL.
    async fn transmit(
        &self,
        target: UploadTarget,
        submission: &AssetSubmission,
    ) -> StorageResult<StoredAsset>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}
