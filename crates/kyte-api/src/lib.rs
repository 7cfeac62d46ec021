//! Kyte API Library
//!
//! HTTP surface of the media ingestion service: route handlers, error
//! rendering, application state and setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod utils;

pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
pub use utils::source_guard::SourceGuard;
