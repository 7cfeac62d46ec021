//! Tracing initialization
//!
//! Installs the global `tracing` subscriber once at startup.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
