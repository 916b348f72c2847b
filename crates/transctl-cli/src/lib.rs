#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line controller for Transmission and qBittorrent daemons.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `client.rs`: errors, the per-invocation context, session resolution
//! - `registry.rs`: protocol name to provider constructor
//! - `commands/`: verb handlers grouped by concern
//! - `output/`: table, JSON/YAML, and flat renderers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod registry;

pub use cli::{run, run_with};
