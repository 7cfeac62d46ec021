//! Kyte Processing Library
//!
//! This crate holds the ingestion pipeline and the pieces it sequences:
//! submission validation, placeholder derivation and the orchestrator that
//! drives a submission through the image store.

pub mod derive;
pub mod pipeline;
#[cfg(feature = "image")]
pub mod placeholder;
pub mod validator;

// Re-export commonly used types
pub use derive::{create_deriver, DeriveError, HttpPlaceholderDeriver, PlaceholderDeriver};
#[cfg(feature = "image")]
pub use derive::InlinePlaceholderDeriver;
pub use pipeline::{IngestPipeline, PipelineOptions, PipelineStage};
#[cfg(feature = "image")]
pub use placeholder::{generate_placeholder, PlaceholderError};
pub use validator::{MediaValidator, ValidationError};
