#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! Transmission JSON-RPC provider.
//!
//! Layout:
//! - `client.rs`: envelope codec, session-id handshake, credential fallback
//! - `request.rs`: typed method arguments and replies
//! - `provider.rs`: the `Provider` capability set over the client
//! - `config.rs`: `session-get` / `session-set` remote configuration

pub mod client;
pub mod config;
pub mod provider;
pub mod request;

pub use client::{DEFAULT_URL, SESSION_ID_HEADER, TransmissionClient};
pub use config::SessionBackend;
pub use provider::{PROVIDER_NAME, TransmissionProvider};
