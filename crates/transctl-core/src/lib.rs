#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! Domain types and provider contracts shared across the transctl workspace.
//!
//! Layout:
//! - `units.rs` / `enums.rs`: wire-tolerant value types with human formatting
//! - `cell.rs` / `record.rs`: typed cells and per-record column descriptors
//! - `model/`: torrent, file, peer, tracker, and session records plus requests
//! - `provider.rs`: the capability set every daemon client implements
//! - `connect.rs`: endpoint, timeout, retries, and fallback credentials
//! - `remote.rs`: key/value config façade and the type-directed coercer

pub mod cell;
pub mod connect;
pub mod enums;
pub mod error;
pub mod model;
pub mod provider;
pub mod record;
pub mod remote;
pub mod units;

pub use cell::Cell;
pub use connect::{Credentials, DEFAULT_RETRIES, DEFAULT_TIMEOUT, SessionConfig};
pub use enums::{Encryption, FilePriority, Mode, PieceState, Priority, Status, TrackerState};
pub use error::{ProviderError, ProviderResult};
pub use model::{
    AddTorrent, AddedTorrent, FileChanges, FreeSpace, Peer, QueueMove, SessionStats,
    StatsSnapshot, Torrent, TorrentChanges, TorrentFile, TorrentId, TorrentIds, TorrentSource,
    Tracker,
};
pub use provider::Provider;
pub use record::{Column, Record};
pub use remote::{ConfigBackend, ConfigStore, RemoteConfig, coerce, flatten, json_number};
pub use units::{
    BoolInt, ByteCount, ByteFormat, ByteUnit, Eta, KiLimit, Limit, Percent, Rate, Timestamp,
    TimestampMs, format_bytes,
};
