#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! Logging setup for transctl.
//!
//! Layout:
//! - `init.rs`: `init_logging`, `LoggingConfig`, `LogFormat`, verbosity levels
//! - `error.rs`: `TelemetryError`

pub mod error;
pub mod init;

pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging, installed_format,
    level_for_verbosity,
};
