//! Kyte Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! the storage, processing and API crates of the media ingestion service.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, ProviderCredentials};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AbsentReason, AssetSubmission, DerivedAsset, PipelineResult, PlaceholderRequest,
    PlaceholderResponse, StoredAsset, UploadResponse, UploadTarget, UploadUrlResponse,
};
