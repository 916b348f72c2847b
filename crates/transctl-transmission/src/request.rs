//! Typed argument objects for the RPC methods, with chainable setters.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use transctl_core::{
    AddTorrent, AddedTorrent, FileChanges, FilePriority, Limit, Mode, Peer, Priority,
    TorrentChanges, TorrentIds, TorrentSource, Tracker,
};

/// Arguments of `torrent-get`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentGet {
    #[serde(skip_serializing_if = "TorrentIds::is_all")]
    ids: TorrentIds,
    fields: Vec<String>,
}

impl TorrentGet {
    /// Request every torrent with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to `ids`.
    #[must_use]
    pub fn with_ids(mut self, ids: TorrentIds) -> Self {
        self.ids = ids;
        self
    }

    /// Request `fields`, de-duplicated in order.
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }
}

/// Reply of `torrent-get`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TorrentList<T> {
    /// Matching torrents.
    pub torrents: Vec<T>,
}

/// Per-torrent sub-entity lists as delivered by `torrent-get`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TorrentDetails {
    /// Content hash.
    pub hash_string: String,
    /// Static file list.
    pub files: Vec<WireFile>,
    /// Mutable per-file state, parallel to `files`.
    pub file_stats: Vec<WireFileStat>,
    /// Connected peers.
    pub peers: Vec<Peer>,
    /// Tracker statistics.
    pub tracker_stats: Vec<Tracker>,
}

/// Entry of the `files` array.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireFile {
    /// Relative path.
    pub name: String,
    /// Size in bytes.
    pub length: i64,
    /// Bytes downloaded.
    pub bytes_completed: i64,
}

/// Entry of the `fileStats` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFileStat {
    /// Selected for download.
    #[serde(default)]
    pub wanted: bool,
    /// Download priority.
    pub priority: FilePriority,
}

impl Default for WireFileStat {
    fn default() -> Self {
        Self {
            wanted: true,
            priority: FilePriority::Normal,
        }
    }
}

/// Arguments of `torrent-add`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentAdd {
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metainfo: Option<String>,
    #[serde(rename = "download-dir", skip_serializing_if = "Option::is_none")]
    download_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paused: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(rename = "peer-limit", skip_serializing_if = "Option::is_none")]
    peer_limit: Option<i64>,
    #[serde(rename = "bandwidthPriority", skip_serializing_if = "Option::is_none")]
    bandwidth_priority: Option<Priority>,
}

impl TorrentAdd {
    /// Add from a URL or magnet link.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Add from raw metainfo bytes (sent base64-encoded).
    #[must_use]
    pub fn with_metainfo(mut self, bytes: &[u8]) -> Self {
        self.metainfo = Some(STANDARD.encode(bytes));
        self
    }

    /// Target directory.
    #[must_use]
    pub fn with_download_dir(mut self, dir: Option<String>) -> Self {
        self.download_dir = dir;
        self
    }

    /// Add without starting.
    #[must_use]
    pub const fn with_paused(mut self, paused: bool) -> Self {
        self.paused = if paused { Some(true) } else { None };
        self
    }

    /// Labels.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Peer limit.
    #[must_use]
    pub const fn with_peer_limit(mut self, limit: Option<i64>) -> Self {
        self.peer_limit = limit;
        self
    }

    /// Bandwidth priority.
    #[must_use]
    pub const fn with_bandwidth_priority(mut self, priority: Option<Priority>) -> Self {
        self.bandwidth_priority = priority;
        self
    }
}

impl From<AddTorrent> for TorrentAdd {
    fn from(request: AddTorrent) -> Self {
        let base = match &request.source {
            TorrentSource::File { bytes, .. } => Self::default().with_metainfo(bytes),
            TorrentSource::Url(url) => Self::default().with_filename(url.clone()),
        };
        base.with_download_dir(request.download_dir)
            .with_paused(request.paused)
            .with_labels(request.labels)
            .with_peer_limit(request.peer_limit)
            .with_bandwidth_priority(request.bandwidth_priority)
    }
}

/// Reply of `torrent-add`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TorrentAddReply {
    /// Set when the torrent is new.
    #[serde(rename = "torrent-added")]
    pub added: Option<AddedTorrent>,
    /// Set when the daemon already had the torrent.
    #[serde(rename = "torrent-duplicate")]
    pub duplicate: Option<AddedTorrent>,
}

impl TorrentAddReply {
    /// Collapse into one identity, flagging duplicates.
    #[must_use]
    pub fn into_added(self) -> Option<AddedTorrent> {
        self.added.or_else(|| {
            self.duplicate.map(|mut torrent| {
                torrent.duplicate = true;
                torrent
            })
        })
    }
}

/// Arguments of `torrent-set`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentSet {
    #[serde(skip_serializing_if = "TorrentIds::is_all")]
    ids: TorrentIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    bandwidth_priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_limit: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_limited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_limit: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload_limited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    honors_session_limits: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed_ratio_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed_ratio_mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed_idle_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed_idle_mode: Option<Mode>,
    #[serde(rename = "peer-limit", skip_serializing_if = "Option::is_none")]
    peer_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<String>>,
    #[serde(rename = "files-wanted", skip_serializing_if = "Option::is_none")]
    files_wanted: Option<Vec<usize>>,
    #[serde(rename = "files-unwanted", skip_serializing_if = "Option::is_none")]
    files_unwanted: Option<Vec<usize>>,
    #[serde(rename = "priority-high", skip_serializing_if = "Option::is_none")]
    priority_high: Option<Vec<usize>>,
    #[serde(rename = "priority-normal", skip_serializing_if = "Option::is_none")]
    priority_normal: Option<Vec<usize>>,
    #[serde(rename = "priority-low", skip_serializing_if = "Option::is_none")]
    priority_low: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracker_add: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracker_remove: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracker_replace: Option<Vec<Value>>,
}

impl TorrentSet {
    /// Address `ids` with nothing to change yet.
    #[must_use]
    pub fn new(ids: TorrentIds) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    /// Apply per-torrent setting changes.
    #[must_use]
    pub fn with_changes(mut self, changes: &TorrentChanges) -> Self {
        self.bandwidth_priority = changes.bandwidth_priority;
        self.download_limit = changes.download_limit;
        self.download_limited = changes.download_limited;
        self.upload_limit = changes.upload_limit;
        self.upload_limited = changes.upload_limited;
        self.honors_session_limits = changes.honors_session_limits;
        self.seed_ratio_limit = changes.seed_ratio_limit;
        self.seed_ratio_mode = changes.seed_ratio_mode;
        self.seed_idle_limit = changes.seed_idle_limit;
        self.seed_idle_mode = changes.seed_idle_mode;
        self.peer_limit = changes.peer_limit;
        self.queue_position = changes.queue_position;
        self.labels.clone_from(&changes.labels);
        self
    }

    /// Apply file priority and wanted flags; empty indices mean every file.
    #[must_use]
    pub fn with_files(mut self, changes: &FileChanges) -> Self {
        let indices = Some(changes.indices.clone());
        match changes.wanted {
            Some(true) => self.files_wanted.clone_from(&indices),
            Some(false) => self.files_unwanted.clone_from(&indices),
            None => {}
        }
        match changes.priority {
            Some(FilePriority::High) => self.priority_high = indices,
            Some(FilePriority::Normal) => self.priority_normal = indices,
            Some(FilePriority::Low) => self.priority_low = indices,
            None => {}
        }
        self
    }

    /// Add announce URLs.
    #[must_use]
    pub fn with_tracker_add(mut self, urls: &[String]) -> Self {
        self.tracker_add = Some(urls.to_vec());
        self
    }

    /// Remove trackers by id.
    #[must_use]
    pub fn with_tracker_remove(mut self, ids: &[i64]) -> Self {
        self.tracker_remove = Some(ids.to_vec());
        self
    }

    /// Replace the announce URL of tracker `id`.
    #[must_use]
    pub fn with_tracker_replace(mut self, id: i64, url: &str) -> Self {
        self.tracker_replace = Some(vec![Value::from(id), Value::from(url)]);
        self
    }
}

/// Arguments of the id-only action methods.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentAction {
    #[serde(skip_serializing_if = "TorrentIds::is_all")]
    ids: TorrentIds,
}

impl TorrentAction {
    /// Address `ids`.
    #[must_use]
    pub const fn new(ids: TorrentIds) -> Self {
        Self { ids }
    }
}

/// Arguments of `torrent-remove`.
#[derive(Debug, Clone, Serialize)]
pub struct TorrentRemove {
    #[serde(skip_serializing_if = "TorrentIds::is_all")]
    ids: TorrentIds,
    #[serde(rename = "delete-local-data")]
    delete_local_data: bool,
}

impl TorrentRemove {
    /// Address `ids`, keeping data.
    #[must_use]
    pub const fn new(ids: TorrentIds) -> Self {
        Self {
            ids,
            delete_local_data: false,
        }
    }

    /// Also delete the payload.
    #[must_use]
    pub const fn with_delete_local_data(mut self, delete: bool) -> Self {
        self.delete_local_data = delete;
        self
    }
}

/// Arguments of `torrent-set-location`.
#[derive(Debug, Clone, Serialize)]
pub struct TorrentSetLocation {
    #[serde(skip_serializing_if = "TorrentIds::is_all")]
    ids: TorrentIds,
    location: String,
    #[serde(rename = "move")]
    move_data: bool,
}

impl TorrentSetLocation {
    /// Point `ids` at `location`, moving data.
    #[must_use]
    pub fn new(ids: TorrentIds, location: impl Into<String>) -> Self {
        Self {
            ids,
            location: location.into(),
            move_data: true,
        }
    }

    /// Whether to move data or only re-point.
    #[must_use]
    pub const fn with_move(mut self, move_data: bool) -> Self {
        self.move_data = move_data;
        self
    }
}

/// Arguments of `torrent-rename-path`.
#[derive(Debug, Clone, Serialize)]
pub struct TorrentRenamePath {
    ids: TorrentIds,
    path: String,
    name: String,
}

impl TorrentRenamePath {
    /// Rename `path` inside the torrent with `hash` to `name`.
    #[must_use]
    pub fn new(hash: &str, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ids: TorrentIds::hashes([hash]),
            path: path.into(),
            name: name.into(),
        }
    }
}

/// Arguments of `free-space`.
#[derive(Debug, Clone, Serialize)]
pub struct FreeSpaceRequest {
    path: String,
}

impl FreeSpaceRequest {
    /// Query `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Reply of `blocklist-update`.
#[derive(Debug, Default, Deserialize)]
pub struct BlocklistReply {
    /// Rules loaded.
    #[serde(rename = "blocklist-size", default)]
    pub size: i64,
}

/// Reply of `port-test`.
#[derive(Debug, Default, Deserialize)]
pub struct PortTestReply {
    /// Whether the peer port is reachable.
    #[serde(rename = "port-is-open", default)]
    pub open: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use transctl_core::TorrentId;

    use super::*;

    #[test]
    fn torrent_get_omits_ids_for_all() -> Result<(), serde_json::Error> {
        let request = TorrentGet::new().with_fields(["hashString", "name", "hashString"]);
        assert_eq!(
            serde_json::to_value(&request)?,
            json!({"fields": ["hashString", "name"]})
        );
        let recent = TorrentGet::new().with_ids(TorrentIds::RecentlyActive);
        assert_eq!(
            serde_json::to_value(&recent)?,
            json!({"ids": "recently-active", "fields": []})
        );
        Ok(())
    }

    #[test]
    fn torrent_set_emits_only_changes() -> Result<(), serde_json::Error> {
        let changes = TorrentChanges {
            download_limit: Some(Limit(100)),
            download_limited: Some(true),
            peer_limit: Some(40),
            ..TorrentChanges::default()
        };
        let request = TorrentSet::new(TorrentIds::List(vec![TorrentId::Hash("abc".into())]))
            .with_changes(&changes)
            .with_files(&FileChanges {
                indices: vec![0, 2],
                priority: Some(FilePriority::High),
                wanted: None,
            });
        assert_eq!(
            serde_json::to_value(&request)?,
            json!({
                "ids": ["abc"],
                "downloadLimit": 100,
                "downloadLimited": true,
                "peer-limit": 40,
                "priority-high": [0, 2],
            })
        );
        Ok(())
    }

    #[test]
    fn add_encodes_metainfo() -> Result<(), serde_json::Error> {
        let mut request = AddTorrent::new(TorrentSource::File {
            name: "a.torrent".into(),
            bytes: b"d4:infoe".to_vec(),
        });
        request.paused = true;
        let value = serde_json::to_value(TorrentAdd::from(request))?;
        assert_eq!(value, json!({"metainfo": "ZDQ6aW5mb2U=", "paused": true}));
        Ok(())
    }

    #[test]
    fn duplicate_reply_is_flagged() -> Result<(), serde_json::Error> {
        let reply: TorrentAddReply = serde_json::from_value(json!({
            "torrent-duplicate": {"id": 4, "name": "x", "hashString": "ffff"}
        }))?;
        let added = reply.into_added().expect("identity present");
        assert!(added.duplicate);
        assert_eq!(added.id, 4);
        Ok(())
    }
}
