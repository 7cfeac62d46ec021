//! Ingestion pipeline
//!
//! Drives one submission through validation, upload-target acquisition,
//! transmission and (for avatars) placeholder derivation.
//!
//! A single deadline covers acquisition, transmission and derivation. Failures
//! up to and including transmission fail the run; anything that goes wrong
//! while deriving only downgrades the placeholder to `Absent`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kyte_core::{
    AbsentReason, AppError, AssetSubmission, Config, DerivedAsset, ErrorMetadata, LogLevel,
    PipelineResult, StoredAsset,
};
use kyte_storage::{ImageStore, StorageResult};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::derive::PlaceholderDeriver;
use crate::validator::MediaValidator;

/// Pipeline stage, used for logging and for naming where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Acquiring,
    Transmitting,
    Deriving,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Acquiring => "acquiring",
            PipelineStage::Transmitting => "transmitting",
            PipelineStage::Deriving => "deriving",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Budget for acquire + transmit + derive.
    pub deadline: Duration,
    /// Additional bound on the derive call alone.
    pub derive_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            derive_timeout: Duration::from_millis(8000),
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            deadline: config.pipeline_deadline,
            derive_timeout: config.derive_timeout,
        }
    }
}

/// Sequences the ingestion stages for one submission at a time.
///
/// Holds no per-run state; share one instance behind an `Arc`.
pub struct IngestPipeline {
    validator: MediaValidator,
    store: Arc<dyn ImageStore>,
    deriver: Arc<dyn PlaceholderDeriver>,
    options: PipelineOptions,
}

impl IngestPipeline {
    pub fn new(
        validator: MediaValidator,
        store: Arc<dyn ImageStore>,
        deriver: Arc<dyn PlaceholderDeriver>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            validator,
            store,
            deriver,
            options,
        }
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn ImageStore>,
        deriver: Arc<dyn PlaceholderDeriver>,
    ) -> Self {
        Self::new(
            MediaValidator::from_config(config),
            store,
            deriver,
            PipelineOptions::from(config),
        )
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Run a submission to completion.
    ///
    /// Dropping the returned future abandons the run; nothing already sent to
    /// the provider is undone.
    pub async fn run(&self, submission: AssetSubmission) -> PipelineResult {
        self.run_cancellable(submission, &CancellationToken::new())
            .await
    }

    /// Run a submission, stopping early when `cancel` fires.
    ///
    /// Cancellation before the provider confirmed the upload fails the run;
    /// cancellation while deriving keeps the stored asset.
    pub async fn run_cancellable(
        &self,
        submission: AssetSubmission,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "ingest",
            run_id = %run_id,
            avatar = submission.is_avatar,
            size = submission.byte_len(),
            content_type = %submission.content_type,
        );

        self.execute(submission, cancel).instrument(span).await
    }

    async fn execute(
        &self,
        submission: AssetSubmission,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        enter(PipelineStage::Validating);
        if let Err(e) = self.validator.validate(&submission) {
            return fail(PipelineStage::Validating, e.into());
        }

        let deadline = Instant::now() + self.options.deadline;

        enter(PipelineStage::Acquiring);
        let target = match self
            .bounded(
                PipelineStage::Acquiring,
                deadline,
                cancel,
                self.store.request_upload_target(),
            )
            .await
        {
            Ok(target) => target,
            Err(e) => return fail(PipelineStage::Acquiring, e),
        };

        enter(PipelineStage::Transmitting);
        let stored = match self
            .bounded(
                PipelineStage::Transmitting,
                deadline,
                cancel,
                self.store.transmit(target, &submission),
            )
            .await
        {
            Ok(stored) => stored,
            Err(e) => return fail(PipelineStage::Transmitting, e),
        };

        let derived = if submission.is_avatar {
            enter(PipelineStage::Deriving);
            self.derive(&stored, deadline, cancel).await
        } else {
            DerivedAsset::Absent(AbsentReason::NotRequested)
        };

        tracing::info!(
            stage = %PipelineStage::Done,
            public_url = %stored.public_url(),
            placeholder = derived.is_present(),
            "Ingestion complete"
        );

        PipelineResult::Stored { stored, derived }
    }

    /// Race a provider call against the run deadline and cancellation.
    async fn bounded<T, F>(
        &self,
        stage: PipelineStage,
        deadline: Instant,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = StorageResult<T>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled(stage.to_string())),
            outcome = timeout_at(deadline, call) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(AppError::Timeout(stage.to_string())),
            },
        }
    }

    async fn derive(
        &self,
        stored: &StoredAsset,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> DerivedAsset {
        let derive_deadline = deadline.min(Instant::now() + self.options.derive_timeout);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Placeholder derivation cancelled");
                DerivedAsset::Absent(AbsentReason::Cancelled)
            }
            outcome = timeout_at(derive_deadline, self.deriver.derive(stored.public_url())) => match outcome {
                Ok(Ok(payload)) if !payload.is_empty() => DerivedAsset::Present(payload),
                Ok(Ok(_)) => {
                    tracing::warn!(deriver = self.deriver.name(), "Placeholder derivation returned an empty payload");
                    DerivedAsset::Absent(AbsentReason::Failed)
                }
                Ok(Err(e)) => {
                    tracing::warn!(deriver = self.deriver.name(), error = %e, "Placeholder derivation failed");
                    DerivedAsset::Absent(AbsentReason::Failed)
                }
                Err(_) => {
                    tracing::warn!(deriver = self.deriver.name(), "Placeholder derivation exceeded its deadline");
                    DerivedAsset::Absent(AbsentReason::DeadlineExceeded)
                }
            },
        }
    }
}

fn enter(stage: PipelineStage) {
    tracing::debug!(stage = %stage, "Entering stage");
}

fn fail(stage: PipelineStage, error: AppError) -> PipelineResult {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(
            stage = %PipelineStage::Failed,
            failed_at = %stage,
            error = %error,
            "Ingestion rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            stage = %PipelineStage::Failed,
            failed_at = %stage,
            error = %error,
            "Ingestion failed"
        ),
        LogLevel::Error => tracing::error!(
            stage = %PipelineStage::Failed,
            failed_at = %stage,
            error = %error,
            "Ingestion failed"
        ),
    }
    PipelineResult::Failed(error)
}
