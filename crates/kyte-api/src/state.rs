//! Application state shared by the route handlers.

use kyte_core::Config;
use kyte_processing::{IngestPipeline, PlaceholderDeriver};
use kyte_storage::ImageStore;
use std::sync::Arc;

use crate::utils::source_guard::SourceGuard;

pub struct AppState {
    pub config: Arc<Config>,
    /// Drives `POST /api/images/upload`.
    pub pipeline: Arc<IngestPipeline>,
    /// Used directly by `GET /api/images/getuploadurl`.
    pub store: Arc<dyn ImageStore>,
    /// Serves `POST /api/images/createblurpfp`; always in-process.
    pub placeholder_generator: Arc<dyn PlaceholderDeriver>,
    pub source_guard: SourceGuard,
}

impl AppState {
    /// Wire the pipeline from its collaborators.
    ///
    /// `deriver` is what the pipeline calls for avatars; `placeholder_generator`
    /// backs the placeholder route. They are the same instance unless
    /// `PLACEHOLDER_ENDPOINT` points the pipeline at a remote service.
    pub fn new(
        config: Config,
        store: Arc<dyn ImageStore>,
        deriver: Arc<dyn PlaceholderDeriver>,
        placeholder_generator: Arc<dyn PlaceholderDeriver>,
    ) -> Self {
        let pipeline = IngestPipeline::from_config(&config, store.clone(), deriver);
        let source_guard = SourceGuard::from_config(&config);
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            store,
            placeholder_generator,
            source_guard,
        }
    }

    /// Replace the placeholder source guard (local test servers live on loopback).
    pub fn with_source_guard(mut self, guard: SourceGuard) -> Self {
        self.source_guard = guard;
        self
    }
}
