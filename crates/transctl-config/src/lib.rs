#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! Local configuration for transctl: the Git-style INI store, context
//! resolution, and netrc credentials.
//!
//! Layout:
//! - `ini.rs`: document model, parser, serialiser
//! - `store.rs`: `LocalConfig` file store and config path discovery
//! - `context.rs`: flag, context, default lookup with typed accessors
//! - `netrc.rs`: netrc parsing and host lookup
//! - `defaults.rs` / `error.rs`: shared names and `ConfigError`

pub mod context;
pub mod defaults;
pub mod error;
pub mod ini;
pub mod netrc;
pub mod store;

pub use context::{Context, parse_duration};
pub use defaults::{CONFIG_ENV, CONTEXT_ENV, DEFAULT_CONFIG, URL_ENV};
pub use error::{ConfigError, ConfigResult};
pub use ini::{Document, Key};
pub use netrc::{Machine, Netrc};
pub use store::{LocalConfig, config_path};
