//! Kyte Storage Library
//!
//! This crate provides the image storage abstraction used by the ingestion
//! pipeline and its Cloudflare Images implementation.
//!
//! # Upload flow
//!
//! Storing an image takes two provider calls:
//!
//! 1. `request_upload_target` asks the provider for a one-time upload URL.
//! 2. `transmit` consumes that target and sends the bytes to it.
//!
//! The `UploadTarget` is moved into `transmit`, so the same target cannot be
//! used for a second upload.

#[cfg(feature = "storage-cloudflare")]
pub mod cloudflare;
pub mod factory;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloudflare")]
pub use cloudflare::CloudflareImageStore;
pub use factory::create_store;
pub use traits::{ImageStore, StorageError, StorageResult};
