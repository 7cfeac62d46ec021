//! In-memory image store and placeholder deriver.

use async_trait::async_trait;
use kyte_core::{AssetSubmission, StoredAsset, UploadTarget};
use kyte_processing::{DeriveError, PlaceholderDeriver};
use kyte_storage::{ImageStore, StorageError, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const FAKE_PLACEHOLDER: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD";

#[derive(Default)]
pub struct FakeStore {
    pub acquire_calls: AtomicUsize,
    pub transmit_calls: AtomicUsize,
    /// When set, acquisition fails with this status and message.
    pub reject_acquire: Option<(u16, String)>,
    pub targets_seen: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn rejecting(status: u16, message: &str) -> Self {
        Self {
            reject_acquire: Some((status, message.to_string())),
            ..Default::default()
        }
    }

    pub fn acquires(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn transmits(&self) -> usize {
        self.transmit_calls.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for FakeStore {
    async fn request_upload_target(&self) -> StorageResult<UploadTarget> {
        let n = self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = &self.reject_acquire {
            return Err(StorageError::ProviderRejected {
                status: Some(*status),
                message: message.clone(),
            });
        }
        let reference = format!("img-{}", n);
        Ok(UploadTarget::new(
            format!("https://upload.imagedelivery.net/{}", reference),
            reference,
        ))
    }

    async fn transmit(
        &self,
        target: UploadTarget,
        _submission: &AssetSubmission,
    ) -> StorageResult<StoredAsset> {
        self.transmit_calls.fetch_add(1, Ordering::SeqCst);
        let (target_url, reference) = target.into_parts();
        self.targets_seen.lock().unwrap().push(target_url);
        Ok(StoredAsset::new(
            reference.clone(),
            format!("https://imagedelivery.net/test-hash/{}/public", reference),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

pub enum DeriveBehavior {
    Succeed,
    Fail,
    Slow(Duration),
}

pub struct FakeDeriver {
    behavior: DeriveBehavior,
    pub calls: AtomicUsize,
}

impl FakeDeriver {
    pub fn new(behavior: DeriveBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(DeriveBehavior::Succeed)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceholderDeriver for FakeDeriver {
    async fn derive(&self, _public_url: &str) -> Result<String, DeriveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            DeriveBehavior::Succeed => Ok(FAKE_PLACEHOLDER.to_string()),
            DeriveBehavior::Fail => Err(DeriveError::Transport("connection refused".to_string())),
            DeriveBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(FAKE_PLACEHOLDER.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
