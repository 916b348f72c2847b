//! Torrent domain records and request DTOs shared by every provider.

mod entities;
mod request;
mod session;
mod torrent;

pub use entities::{Peer, TorrentFile, Tracker};
pub use request::{
    AddTorrent, AddedTorrent, FileChanges, QueueMove, TorrentChanges, TorrentId, TorrentIds,
    TorrentSource,
};
pub use session::{FreeSpace, SessionStats, StatsSnapshot};
pub use torrent::Torrent;

/// First seven characters of a content hash.
#[must_use]
pub fn short_hash(hash: &str) -> String {
    hash.chars().take(7).collect()
}
