//! Tracing initialization
//!
//! Console output only: human-readable by default, one JSON object per line when
//! `LOG_FORMAT=json`.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry, LogFormat};
