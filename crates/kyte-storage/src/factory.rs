#[cfg(feature = "storage-cloudflare")]
use crate::CloudflareImageStore;
use crate::{ImageStore, StorageResult};
use kyte_core::Config;
use std::sync::Arc;

/// Create the image store described by the configuration
#[cfg(feature = "storage-cloudflare")]
pub fn create_store(config: &Config) -> StorageResult<Arc<dyn ImageStore>> {
    let store = CloudflareImageStore::new(
        config.credentials.clone(),
        config.require_signed_urls,
        config.source_tag.clone(),
    )?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "storage-cloudflare"))]
pub fn create_store(_config: &Config) -> StorageResult<Arc<dyn ImageStore>> {
    Err(crate::StorageError::ConfigMissing(
        "no storage provider available (storage-cloudflare feature not enabled)".to_string(),
    ))
}
