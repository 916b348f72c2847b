//! Typed WebUI endpoints.

use reqwest::multipart::Form;
use serde::Serialize;
use serde_json::{Map, Value};
use transctl_core::{ProviderResult, json_number};

use crate::form::{Endpoint, comma, multipart_from, newline, pipe};

macro_rules! endpoint {
    ($name:ident => $path:expr) => {
        impl Endpoint for $name {
            fn path(&self) -> &'static str {
                $path
            }
        }
    };
}

/// `torrents/info`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'static str>,
    #[serde(serialize_with = "pipe", skip_serializing_if = "Vec::is_empty")]
    hashes: Vec<String>,
}

impl TorrentsInfo {
    /// Every torrent.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Torrents with transfer activity.
    #[must_use]
    pub fn active() -> Self {
        Self {
            filter: Some("active"),
            hashes: Vec::new(),
        }
    }

    /// Only `hashes`.
    #[must_use]
    pub fn with_hashes(mut self, hashes: Vec<String>) -> Self {
        self.hashes = hashes;
        self
    }
}

endpoint!(TorrentsInfo => "torrents/info");

/// Per-hash read endpoints (`torrents/files`, `torrents/trackers`, ...).
#[derive(Debug, Clone, Serialize)]
pub struct ByHash {
    #[serde(skip)]
    path: &'static str,
    hash: String,
}

impl ByHash {
    /// `torrents/files` of `hash`.
    #[must_use]
    pub fn files(hash: &str) -> Self {
        Self {
            path: "torrents/files",
            hash: hash.to_string(),
        }
    }

    /// `torrents/trackers` of `hash`.
    #[must_use]
    pub fn trackers(hash: &str) -> Self {
        Self {
            path: "torrents/trackers",
            hash: hash.to_string(),
        }
    }
}

impl Endpoint for ByHash {
    fn path(&self) -> &'static str {
        self.path
    }
}

/// `sync/torrentPeers`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncTorrentPeers {
    hash: String,
    rid: i64,
}

impl SyncTorrentPeers {
    /// Full peer snapshot of `hash`.
    #[must_use]
    pub fn new(hash: &str) -> Self {
        Self {
            hash: hash.to_string(),
            rid: 0,
        }
    }
}

endpoint!(SyncTorrentPeers => "sync/torrentPeers");

/// Hash-list actions (`torrents/start`, `torrents/recheck`, `torrents/topPrio`, ...).
#[derive(Debug, Clone, Serialize)]
pub struct HashesAction {
    #[serde(skip)]
    path: &'static str,
    #[serde(serialize_with = "pipe")]
    hashes: Vec<String>,
}

impl HashesAction {
    /// Apply `path` to `hashes`.
    #[must_use]
    pub const fn new(path: &'static str, hashes: Vec<String>) -> Self {
        Self { path, hashes }
    }
}

impl Endpoint for HashesAction {
    fn path(&self) -> &'static str {
        self.path
    }
}

/// `torrents/delete`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentsDelete {
    #[serde(serialize_with = "pipe")]
    hashes: Vec<String>,
    delete_files: bool,
}

impl TorrentsDelete {
    /// Remove `hashes`, optionally deleting data.
    #[must_use]
    pub const fn new(hashes: Vec<String>, delete_files: bool) -> Self {
        Self {
            hashes,
            delete_files,
        }
    }
}

endpoint!(TorrentsDelete => "torrents/delete");

/// `torrents/setLocation`, which moves data.
#[derive(Debug, Clone, Serialize)]
pub struct SetLocation {
    #[serde(serialize_with = "pipe")]
    hashes: Vec<String>,
    location: String,
}

impl SetLocation {
    /// Move `hashes` to `location`.
    #[must_use]
    pub fn new(hashes: Vec<String>, location: &str) -> Self {
        Self {
            hashes,
            location: location.to_string(),
        }
    }
}

endpoint!(SetLocation => "torrents/setLocation");

/// `torrents/setSavePath`, which only re-points the torrent.
#[derive(Debug, Clone, Serialize)]
pub struct SetSavePath {
    #[serde(serialize_with = "pipe")]
    id: Vec<String>,
    path: String,
}

impl SetSavePath {
    /// Point `hashes` at `path` without moving data.
    #[must_use]
    pub fn new(hashes: Vec<String>, path: &str) -> Self {
        Self {
            id: hashes,
            path: path.to_string(),
        }
    }
}

endpoint!(SetSavePath => "torrents/setSavePath");

/// `torrents/add`, always sent as multipart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorrentsAdd {
    #[serde(serialize_with = "newline", skip_serializing_if = "Vec::is_empty")]
    urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    savepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stopped: Option<bool>,
    #[serde(serialize_with = "comma", skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(skip)]
    files: Vec<(String, Vec<u8>)>,
}

impl TorrentsAdd {
    /// Add from a URL or magnet link.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }

    /// Upload a local `.torrent` file.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.push((name.into(), bytes));
        self
    }

    /// Save path.
    #[must_use]
    pub fn with_save_path(mut self, path: Option<String>) -> Self {
        self.savepath = path;
        self
    }

    /// Add without starting (both the v4 and v5 parameter names).
    #[must_use]
    pub const fn with_paused(mut self, paused: bool) -> Self {
        if paused {
            self.paused = Some(true);
            self.stopped = Some(true);
        }
        self
    }

    /// Tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl Endpoint for TorrentsAdd {
    fn path(&self) -> &'static str {
        "torrents/add"
    }

    fn multipart(&self) -> ProviderResult<Option<Form>> {
        multipart_from(self, self.files.clone()).map(Some)
    }
}

/// `torrents/setDownloadLimit` / `torrents/setUploadLimit` in bytes per second.
#[derive(Debug, Clone, Serialize)]
pub struct SetLimit {
    #[serde(skip)]
    path: &'static str,
    #[serde(serialize_with = "pipe")]
    hashes: Vec<String>,
    limit: i64,
}

impl SetLimit {
    /// Download limit of `hashes`; zero removes it.
    #[must_use]
    pub const fn download(hashes: Vec<String>, limit: i64) -> Self {
        Self {
            path: "torrents/setDownloadLimit",
            hashes,
            limit,
        }
    }

    /// Upload limit of `hashes`; zero removes it.
    #[must_use]
    pub const fn upload(hashes: Vec<String>, limit: i64) -> Self {
        Self {
            path: "torrents/setUploadLimit",
            hashes,
            limit,
        }
    }
}

impl Endpoint for SetLimit {
    fn path(&self) -> &'static str {
        self.path
    }
}

/// `torrents/setShareLimits`; `-2` follows the global limit, `-1` disables it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetShareLimits {
    #[serde(serialize_with = "pipe")]
    hashes: Vec<String>,
    ratio_limit: f64,
    seeding_time_limit: i64,
    inactive_seeding_time_limit: i64,
}

impl SetShareLimits {
    /// Share limits for `hashes`, every limit following the global setting.
    #[must_use]
    pub const fn new(hashes: Vec<String>) -> Self {
        Self {
            hashes,
            ratio_limit: -2.0,
            seeding_time_limit: -2,
            inactive_seeding_time_limit: -2,
        }
    }

    /// Ratio limit.
    #[must_use]
    pub const fn with_ratio_limit(mut self, limit: f64) -> Self {
        self.ratio_limit = limit;
        self
    }

    /// Idle minutes before seeding stops.
    #[must_use]
    pub const fn with_inactive_limit(mut self, minutes: i64) -> Self {
        self.inactive_seeding_time_limit = minutes;
        self
    }
}

endpoint!(SetShareLimits => "torrents/setShareLimits");

/// `torrents/addTags` / `torrents/removeTags`.
#[derive(Debug, Clone, Serialize)]
pub struct Tags {
    #[serde(skip)]
    path: &'static str,
    #[serde(serialize_with = "pipe")]
    hashes: Vec<String>,
    #[serde(serialize_with = "comma")]
    tags: Vec<String>,
}

impl Tags {
    /// Add `tags` to `hashes`.
    #[must_use]
    pub const fn add(hashes: Vec<String>, tags: Vec<String>) -> Self {
        Self {
            path: "torrents/addTags",
            hashes,
            tags,
        }
    }

    /// Remove every tag from `hashes`.
    #[must_use]
    pub const fn clear(hashes: Vec<String>) -> Self {
        Self {
            path: "torrents/removeTags",
            hashes,
            tags: Vec::new(),
        }
    }
}

impl Endpoint for Tags {
    fn path(&self) -> &'static str {
        self.path
    }
}

/// `torrents/filePrio`.
#[derive(Debug, Clone, Serialize)]
pub struct FilePrio {
    hash: String,
    #[serde(serialize_with = "pipe")]
    id: Vec<String>,
    priority: i64,
}

impl FilePrio {
    /// Set `priority` on file `ids` of `hash`.
    #[must_use]
    pub fn new(hash: &str, ids: &[usize], priority: i64) -> Self {
        Self {
            hash: hash.to_string(),
            id: ids.iter().map(ToString::to_string).collect(),
            priority,
        }
    }
}

endpoint!(FilePrio => "torrents/filePrio");

/// `torrents/renameFile`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFile {
    hash: String,
    old_path: String,
    new_path: String,
}

impl RenameFile {
    /// Rename `old_path` to `new_path` inside `hash`.
    #[must_use]
    pub fn new(hash: &str, old_path: &str, new_path: String) -> Self {
        Self {
            hash: hash.to_string(),
            old_path: old_path.to_string(),
            new_path,
        }
    }
}

endpoint!(RenameFile => "torrents/renameFile");

/// `torrents/addTrackers`.
#[derive(Debug, Clone, Serialize)]
pub struct AddTrackers {
    hash: String,
    #[serde(serialize_with = "newline")]
    urls: Vec<String>,
}

impl AddTrackers {
    /// Add `urls` to `hash`.
    #[must_use]
    pub fn new(hash: &str, urls: &[String]) -> Self {
        Self {
            hash: hash.to_string(),
            urls: urls.to_vec(),
        }
    }
}

endpoint!(AddTrackers => "torrents/addTrackers");

/// `torrents/editTracker`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTracker {
    hash: String,
    orig_url: String,
    new_url: String,
}

impl EditTracker {
    /// Replace `orig_url` by `new_url` on `hash`.
    #[must_use]
    pub fn new(hash: &str, orig_url: String, new_url: &str) -> Self {
        Self {
            hash: hash.to_string(),
            orig_url,
            new_url: new_url.to_string(),
        }
    }
}

endpoint!(EditTracker => "torrents/editTracker");

/// `torrents/removeTrackers`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveTrackers {
    hash: String,
    #[serde(serialize_with = "pipe")]
    urls: Vec<String>,
}

impl RemoveTrackers {
    /// Remove `urls` from `hash`.
    #[must_use]
    pub fn new(hash: &str, urls: Vec<String>) -> Self {
        Self {
            hash: hash.to_string(),
            urls,
        }
    }
}

endpoint!(RemoveTrackers => "torrents/removeTrackers");

/// Parameterless endpoints (`transfer/info`, `app/preferences`, ...).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Plain {
    #[serde(skip)]
    path: &'static str,
}

impl Plain {
    /// `transfer/info`.
    pub const TRANSFER_INFO: Self = Self {
        path: "transfer/info",
    };
    /// `app/preferences`.
    pub const PREFERENCES: Self = Self {
        path: "app/preferences",
    };
    /// `app/shutdown`.
    pub const SHUTDOWN: Self = Self {
        path: "app/shutdown",
    };
    /// `sync/maindata`.
    pub const MAINDATA: Self = Self {
        path: "sync/maindata",
    };
}

impl Endpoint for Plain {
    fn path(&self) -> &'static str {
        self.path
    }
}

/// `app/setPreferences` carrying only the fields that were set.
#[derive(Debug, Clone, Default)]
pub struct AppSetPreferences {
    changes: Map<String, Value>,
}

impl AppSetPreferences {
    /// An empty change-set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an arbitrary preference.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.changes.insert(key.into(), value);
        self
    }

    /// Global share ratio limit.
    #[must_use]
    pub fn with_max_ratio(self, ratio: f64) -> Self {
        self.with_value("max_ratio", json_number(ratio))
    }

    /// Default save path.
    #[must_use]
    pub fn with_save_path(self, path: &str) -> Self {
        self.with_value("save_path", Value::from(path))
    }

    /// Incoming peer port.
    #[must_use]
    pub fn with_listen_port(self, port: u16) -> Self {
        self.with_value("listen_port", Value::from(port))
    }

    /// Global download limit in bytes per second.
    #[must_use]
    pub fn with_dl_limit(self, limit: i64) -> Self {
        self.with_value("dl_limit", Value::from(limit))
    }

    /// Global upload limit in bytes per second.
    #[must_use]
    pub fn with_up_limit(self, limit: i64) -> Self {
        self.with_value("up_limit", Value::from(limit))
    }

    /// Whether torrent queueing is enabled.
    #[must_use]
    pub fn with_queueing_enabled(self, enabled: bool) -> Self {
        self.with_value("queueing_enabled", Value::from(enabled))
    }

    /// Recorded changes.
    #[must_use]
    pub const fn changes(&self) -> &Map<String, Value> {
        &self.changes
    }
}

impl From<Map<String, Value>> for AppSetPreferences {
    fn from(changes: Map<String, Value>) -> Self {
        Self { changes }
    }
}

impl Serialize for AppSetPreferences {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::{Error, SerializeStruct};
        let json = serde_json::to_string(&self.changes).map_err(S::Error::custom)?;
        let mut form = serializer.serialize_struct("AppSetPreferences", 1)?;
        form.serialize_field("json", &json)?;
        form.end()
    }
}

endpoint!(AppSetPreferences => "app/setPreferences");

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn preferences_submit_only_changed_fields() -> Result<(), serde_json::Error> {
        let request = AppSetPreferences::new().with_max_ratio(2.0);
        assert_eq!(
            serde_json::to_value(&request)?,
            json!({"json": r#"{"max_ratio":2}"#})
        );
        Ok(())
    }

    #[test]
    fn save_path_variant_uses_id_parameter() -> Result<(), serde_json::Error> {
        let moved = SetLocation::new(vec!["a".into(), "b".into()], "/new");
        assert_eq!(
            serde_json::to_value(&moved)?,
            json!({"hashes": "a|b", "location": "/new"})
        );
        let repointed = SetSavePath::new(vec!["a".into()], "/new");
        assert_eq!(
            serde_json::to_value(&repointed)?,
            json!({"id": "a", "path": "/new"})
        );
        Ok(())
    }
}
