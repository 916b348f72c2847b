//! Provider-neutral request payloads.

use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::enums::{FilePriority, Mode, Priority};
use crate::model::short_hash;
use crate::units::Limit;

/// One torrent address accepted by the daemons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TorrentId {
    /// Daemon-local numeric id.
    Id(i64),
    /// Content hash.
    Hash(String),
}

impl TorrentId {
    /// Hash form of the id, when it carries one.
    #[must_use]
    pub fn as_hash(&self) -> Option<&str> {
        match self {
            Self::Hash(hash) => Some(hash),
            Self::Id(_) => None,
        }
    }
}

impl fmt::Display for TorrentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(formatter, "{id}"),
            Self::Hash(hash) => formatter.write_str(hash),
        }
    }
}

/// The set of torrents a request addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TorrentIds {
    /// Every torrent on the daemon.
    #[default]
    All,
    /// Torrents active since the previous poll.
    RecentlyActive,
    /// An explicit list.
    List(Vec<TorrentId>),
}

impl TorrentIds {
    /// Address the given hashes.
    pub fn hashes<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(hashes.into_iter().map(|hash| TorrentId::Hash(hash.into())).collect())
    }

    /// Whether the request omits ids entirely.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Hash strings of an explicit list; numeric ids are skipped.
    #[must_use]
    pub fn hash_strings(&self) -> Vec<&str> {
        match self {
            Self::List(ids) => ids.iter().filter_map(TorrentId::as_hash).collect(),
            Self::All | Self::RecentlyActive => Vec::new(),
        }
    }
}

impl Serialize for TorrentIds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_none(),
            Self::RecentlyActive => serializer.serialize_str("recently-active"),
            Self::List(ids) => {
                let mut seq = serializer.serialize_seq(Some(ids.len()))?;
                for id in ids {
                    seq.serialize_element(id)?;
                }
                seq.end()
            }
        }
    }
}

/// Where a new torrent comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentSource {
    /// Raw `.torrent` contents read from a local file.
    File {
        /// File name shown to the daemon.
        name: String,
        /// Metainfo bytes.
        bytes: Vec<u8>,
    },
    /// An http(s) URL or magnet link the daemon fetches itself.
    Url(String),
}

/// Parameters for adding one torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTorrent {
    /// Metainfo source.
    pub source: TorrentSource,
    /// Target directory; the daemon default when absent.
    pub download_dir: Option<String>,
    /// Add without starting.
    pub paused: bool,
    /// Labels (qBittorrent tags).
    pub labels: Vec<String>,
    /// Maximum connected peers.
    pub peer_limit: Option<i64>,
    /// Bandwidth priority.
    pub bandwidth_priority: Option<Priority>,
}

impl AddTorrent {
    /// A request with daemon defaults for everything but the source.
    #[must_use]
    pub const fn new(source: TorrentSource) -> Self {
        Self {
            source,
            download_dir: None,
            paused: false,
            labels: Vec::new(),
            peer_limit: None,
            bandwidth_priority: None,
        }
    }
}

/// Identity of a torrent the daemon accepted (or already had).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddedTorrent {
    /// Daemon-local id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Content hash.
    pub hash_string: String,
    /// Whether the daemon already knew the torrent.
    #[serde(skip)]
    pub duplicate: bool,
}

impl fmt::Display for AddedTorrent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.duplicate { "duplicate" } else { "added" };
        write!(formatter, "{verb} {} {}", short_hash(&self.hash_string), self.name)
    }
}

/// Per-torrent settings to change; `None` leaves a setting untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TorrentChanges {
    /// Bandwidth priority.
    pub bandwidth_priority: Option<Priority>,
    /// Download limit.
    pub download_limit: Option<Limit>,
    /// Whether the download limit applies.
    pub download_limited: Option<bool>,
    /// Upload limit.
    pub upload_limit: Option<Limit>,
    /// Whether the upload limit applies.
    pub upload_limited: Option<bool>,
    /// Whether session limits also apply.
    pub honors_session_limits: Option<bool>,
    /// Seed ratio stop criterion.
    pub seed_ratio_limit: Option<f64>,
    /// Which ratio limit applies.
    pub seed_ratio_mode: Option<Mode>,
    /// Idle minutes before seeding stops.
    pub seed_idle_limit: Option<i64>,
    /// Which idle limit applies.
    pub seed_idle_mode: Option<Mode>,
    /// Maximum connected peers.
    pub peer_limit: Option<i64>,
    /// Position in the queue.
    pub queue_position: Option<i64>,
    /// Replacement label set.
    pub labels: Option<Vec<String>>,
}

impl TorrentChanges {
    /// Whether no setting would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// File-level settings applied to a set of file indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChanges {
    /// Targeted file indices; empty means every file.
    pub indices: Vec<usize>,
    /// New priority.
    pub priority: Option<FilePriority>,
    /// New wanted flag.
    pub wanted: Option<bool>,
}

/// Queue reordering direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMove {
    /// Move to the front.
    Top,
    /// Move one step forward.
    Up,
    /// Move one step back.
    Down,
    /// Move to the back.
    Bottom,
}

impl QueueMove {
    /// Lower-case name of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Up => "up",
            Self::Down => "down",
            Self::Bottom => "bottom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_in_daemon_form() -> Result<(), serde_json::Error> {
        let ids = TorrentIds::List(vec![TorrentId::Id(3), TorrentId::Hash("abc".into())]);
        assert_eq!(serde_json::to_string(&ids)?, r#"[3,"abc"]"#);
        assert_eq!(
            serde_json::to_string(&TorrentIds::RecentlyActive)?,
            r#""recently-active""#
        );
        assert_eq!(TorrentIds::hashes(["a", "b"]).hash_strings(), vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn added_torrent_prints_short_hash() {
        let added = AddedTorrent {
            id: 1,
            name: "debian.iso".into(),
            hash_string: "0123456789abcdef".into(),
            duplicate: true,
        };
        assert_eq!(added.to_string(), "duplicate 0123456 debian.iso");
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(TorrentChanges::default().is_empty());
        let changes = TorrentChanges {
            peer_limit: Some(10),
            ..TorrentChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
