//! Data models for the ingestion service
//!
//! Submission-scoped entities that flow through the pipeline, plus the wire
//! shapes returned by the HTTP surface.

mod asset;
mod response;
mod submission;

pub use asset::*;
pub use response::*;
pub use submission::*;
