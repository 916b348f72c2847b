#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! qBittorrent WebUI provider.
//!
//! Layout:
//! - `client.rs`: cookie-session login, base URL normalisation, status matrix
//! - `form.rs`: the `Endpoint` trait and form/multipart encoding helpers
//! - `request.rs`: typed endpoint parameters
//! - `wire.rs`: reply shapes mapped onto the shared records
//! - `provider.rs`: the `Provider` capability set over the client
//! - `config.rs`: `app/preferences` remote configuration

pub mod client;
pub mod config;
pub mod form;
pub mod provider;
pub mod request;
pub mod wire;

pub use client::{QbitClient, split_url};
pub use config::PreferencesBackend;
pub use provider::{PROVIDER_NAME, QbitProvider};
