//! WebUI reply shapes and their translation into the shared records.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use transctl_core::units::deserialize_lenient_i64;
use transctl_core::{
    BoolInt, ByteCount, Eta, FilePriority, Limit, Mode, Peer, Percent, Rate, Status, Timestamp,
    Torrent, TorrentFile, Tracker, TrackerState,
};
use url::Url;

/// qBittorrent's "infinite" ETA.
const ETA_INFINITE: i64 = 8_640_000;

/// One entry of `torrents/info`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TorrentInfo {
    /// Info hash.
    pub hash: String,
    /// Display name.
    pub name: String,
    /// State keyword (`downloading`, `stalledUP`, ...).
    pub state: String,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    eta: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    dlspeed: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    upspeed: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    completed: i64,
    progress: f64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    total_size: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    size: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    amount_left: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    downloaded: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    uploaded: i64,
    ratio: f64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    added_on: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    completion_on: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    last_activity: i64,
    save_path: String,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    num_seeds: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    num_leechs: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    priority: i64,
    tags: String,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    dl_limit: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    up_limit: i64,
    ratio_limit: f64,
    magnet_uri: String,
    comment: String,
    private: Option<bool>,
}

/// Map a state keyword onto the shared status scale.
#[must_use]
pub fn status_of(state: &str) -> Status {
    match state {
        "checkingUP" | "checkingDL" | "checkingResumeData" => Status::Checking,
        "queuedDL" => Status::DownloadWait,
        "queuedUP" => Status::SeedWait,
        "downloading" | "metaDL" | "forcedMetaDL" | "forcedDL" | "stalledDL" | "allocating" => {
            Status::Downloading
        }
        "uploading" | "stalledUP" | "forcedUP" => Status::Seeding,
        _ => Status::Stopped,
    }
}

fn limit_of(bytes_per_second: i64) -> (Limit, BoolInt) {
    if bytes_per_second > 0 {
        (Limit(bytes_per_second / 1000), BoolInt(true))
    } else {
        (Limit(0), BoolInt(false))
    }
}

fn ratio_mode_of(limit: f64) -> (Option<f64>, Mode) {
    if limit <= -2.0 {
        (None, Mode::Global)
    } else if limit < 0.0 {
        (None, Mode::Unlimited)
    } else {
        (Some(limit), Mode::Single)
    }
}

impl From<TorrentInfo> for Torrent {
    fn from(info: TorrentInfo) -> Self {
        let status = status_of(&info.state);
        let eta = if info.eta >= ETA_INFINITE {
            Eta::Unknown
        } else {
            Eta::from_wire(info.eta)
        };
        let (download_limit, download_limited) = limit_of(info.dl_limit);
        let (upload_limit, upload_limited) = limit_of(info.up_limit);
        let (seed_ratio_limit, seed_ratio_mode) = ratio_mode_of(info.ratio_limit);
        let labels = info
            .tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            id: None,
            hash_string: Some(info.hash),
            name: Some(info.name),
            status: Some(status),
            eta: Some(eta),
            rate_download: Some(Rate(info.dlspeed)),
            rate_upload: Some(Rate(info.upspeed)),
            have_valid: Some(ByteCount(info.completed)),
            percent_done: Some(Percent(info.progress)),
            total_size: Some(ByteCount(info.total_size)),
            size_when_done: Some(ByteCount(info.size)),
            left_until_done: Some(ByteCount(info.amount_left)),
            downloaded_ever: Some(ByteCount(info.downloaded)),
            uploaded_ever: Some(ByteCount(info.uploaded)),
            upload_ratio: Some(info.ratio),
            added_date: Some(Timestamp::from_secs(info.added_on.max(0))),
            done_date: Some(Timestamp::from_secs(info.completion_on.max(0))),
            activity_date: Some(Timestamp::from_secs(info.last_activity.max(0))),
            download_dir: Some(info.save_path),
            error: Some(i64::from(matches!(
                info.state.as_str(),
                "error" | "missingFiles"
            ))),
            error_string: matches!(info.state.as_str(), "error" | "missingFiles")
                .then_some(info.state),
            peers_connected: Some(info.num_seeds + info.num_leechs),
            queue_position: Some(info.priority),
            labels: Some(labels),
            bandwidth_priority: None,
            download_limit: Some(download_limit),
            download_limited: Some(download_limited),
            upload_limit: Some(upload_limit),
            upload_limited: Some(upload_limited),
            seed_ratio_limit,
            seed_ratio_mode: Some(seed_ratio_mode),
            seed_idle_limit: None,
            seed_idle_mode: None,
            honors_session_limits: None,
            peer_limit: None,
            is_finished: Some(BoolInt(matches!(status, Status::Seeding | Status::SeedWait))),
            is_private: info.private.map(BoolInt),
            magnet_link: Some(info.magnet_uri),
            comment: Some(info.comment),
        }
    }
}

/// One entry of `torrents/files`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    index: Option<usize>,
    name: String,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    size: i64,
    progress: f64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    priority: i64,
}

/// qBittorrent priority codes for a wanted file.
#[must_use]
pub const fn priority_code(priority: FilePriority) -> i64 {
    match priority {
        FilePriority::Low | FilePriority::Normal => 1,
        FilePriority::High => 6,
    }
}

impl FileInfo {
    /// Translate into a file record of torrent `hash`; `position` is used
    /// when the daemon predates the `index` field.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "completed bytes are derived from a 0..=1 fraction of the size"
    )]
    pub fn into_file(self, hash: &str, position: usize) -> TorrentFile {
        let completed = (self.size as f64 * self.progress.clamp(0.0, 1.0)).round() as i64;
        TorrentFile {
            hash_string: hash.to_string(),
            index: self.index.unwrap_or(position),
            name: self.name,
            length: ByteCount(self.size),
            bytes_completed: ByteCount(completed),
            wanted: self.priority != 0,
            priority: if self.priority >= 6 {
                FilePriority::High
            } else {
                FilePriority::Normal
            },
        }
    }
}

/// One entry of `torrents/trackers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackerInfo {
    /// Announce URL; DHT, PeX, and LSD appear as `** [DHT] **` pseudo entries.
    pub url: String,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    status: i64,
    tier: Value,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    num_peers: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    num_seeds: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    num_leeches: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    num_downloaded: i64,
    msg: String,
}

impl TrackerInfo {
    /// Whether this is a real tracker rather than a DHT/PeX/LSD placeholder.
    #[must_use]
    pub fn is_tracker(&self) -> bool {
        !self.url.starts_with("** [")
    }

    /// Translate into a tracker record of torrent `hash` with identifier `id`.
    #[must_use]
    pub fn into_tracker(self, hash: &str, id: i64) -> Tracker {
        let (state, succeeded) = match self.status {
            1 => (TrackerState::Waiting, false),
            2 => (TrackerState::Waiting, true),
            3 => (TrackerState::Active, false),
            _ => (TrackerState::Inactive, false),
        };
        let host = Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_default();
        Tracker {
            hash_string: hash.to_string(),
            id,
            host,
            tier: self.tier.as_i64().unwrap_or_default(),
            announce_state: Some(state),
            scrape_state: None,
            last_announce_result: self.msg,
            last_announce_succeeded: succeeded,
            last_announce_peer_count: self.num_peers.max(0),
            seeder_count: self.num_seeds,
            leecher_count: self.num_leeches,
            download_count: self.num_downloaded,
            announce: self.url,
            ..Tracker::default()
        }
    }
}

/// `sync/torrentPeers` snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeersReply {
    /// Peers keyed by `ip:port`.
    pub peers: BTreeMap<String, PeerInfo>,
}

/// One peer of a `sync/torrentPeers` snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeerInfo {
    ip: String,
    port: u16,
    client: String,
    progress: f64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    dl_speed: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    up_speed: i64,
    flags: String,
    connection: String,
}

impl PeerInfo {
    /// Translate into a peer record of torrent `hash`.
    ///
    /// Flag letters follow the WebUI legend: `D`/`d` downloading or
    /// interested-but-choked, `U`/`u` uploading or peer-interested-but-choked,
    /// `E`/`e` encrypted, `I` incoming, `P` µTP.
    #[must_use]
    pub fn into_peer(self, hash: &str, index: usize) -> Peer {
        let has = |flag: char| self.flags.contains(flag);
        let utp = has('P') || self.connection.contains("μTP") || self.connection.contains("uTP");
        Peer {
            hash_string: hash.to_string(),
            index,
            port: self.port,
            client_name: self.client,
            is_encrypted: has('E') || has('e'),
            is_utp: utp,
            is_incoming: has('I'),
            progress: Percent(self.progress),
            rate_to_client: Rate(self.dl_speed),
            rate_to_peer: Rate(self.up_speed),
            peer_is_choked: has('u'),
            peer_is_interested: has('U') || has('u'),
            client_is_choked: has('d'),
            client_is_interested: has('D') || has('d'),
            flag_str: self.flags.replace(' ', ""),
            address: self.ip,
        }
    }
}

/// `transfer/info`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferInfo {
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) dl_info_speed: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) up_info_speed: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) dl_info_data: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) up_info_data: i64,
}

/// `sync/maindata`, reduced to the server state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MainData {
    pub(crate) server_state: ServerState,
}

/// Session-wide counters inside `sync/maindata`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerState {
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) free_space_on_disk: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) alltime_dl: i64,
    #[serde(deserialize_with = "deserialize_lenient_i64")]
    pub(crate) alltime_ul: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn torrent_info_maps_onto_shared_record() -> Result<(), serde_json::Error> {
        let info: TorrentInfo = serde_json::from_value(json!({
            "hash": "abcdef0123456789",
            "name": "debian.iso",
            "state": "stalledUP",
            "eta": 8_640_000,
            "dlspeed": 0,
            "upspeed": 2048,
            "progress": 1.0,
            "total_size": 1.0e9,
            "tags": "linux, iso",
            "dl_limit": 50_000,
            "up_limit": -1,
            "ratio_limit": -2,
            "num_seeds": 2,
            "num_leechs": 3,
        }))?;
        let torrent = Torrent::from(info);
        assert_eq!(torrent.status, Some(Status::Seeding));
        assert_eq!(torrent.eta, Some(Eta::Unknown));
        assert_eq!(torrent.total_size, Some(ByteCount(1_000_000_000)));
        assert_eq!(
            torrent.labels,
            Some(vec!["linux".to_string(), "iso".to_string()])
        );
        assert_eq!(torrent.download_limit, Some(Limit(50)));
        assert_eq!(torrent.download_limited, Some(BoolInt(true)));
        assert_eq!(torrent.upload_limited, Some(BoolInt(false)));
        assert_eq!(torrent.seed_ratio_mode, Some(Mode::Global));
        assert_eq!(torrent.peers_connected, Some(5));
        Ok(())
    }

    #[test]
    fn states_collapse_onto_status_scale() {
        assert_eq!(status_of("checkingResumeData"), Status::Checking);
        assert_eq!(status_of("queuedDL"), Status::DownloadWait);
        assert_eq!(status_of("forcedMetaDL"), Status::Downloading);
        assert_eq!(status_of("stoppedUP"), Status::Stopped);
        assert_eq!(status_of("moving"), Status::Stopped);
    }

    #[test]
    fn skipped_files_are_unwanted() -> Result<(), serde_json::Error> {
        let info: FileInfo = serde_json::from_value(json!({
            "name": "a/b.bin", "size": 1000, "progress": 0.5, "priority": 0
        }))?;
        let file = info.into_file("h", 3);
        assert_eq!(file.index, 3);
        assert!(!file.wanted);
        assert_eq!(file.bytes_completed, ByteCount(500));
        Ok(())
    }

    #[test]
    fn peer_flags_decode() -> Result<(), serde_json::Error> {
        let info: PeerInfo = serde_json::from_value(json!({
            "ip": "10.0.0.2", "port": 51413, "client": "Transmission 4.0",
            "flags": "D E I", "connection": "μTP", "dl_speed": 100
        }))?;
        let peer = info.into_peer("h", 0);
        assert!(peer.is_encrypted && peer.is_incoming && peer.is_utp);
        assert!(peer.client_is_interested && !peer.client_is_choked);
        assert_eq!(peer.flag_str, "DEI");
        assert_eq!(peer.rate_to_client, Rate(100));
        Ok(())
    }

    #[test]
    fn tracker_host_and_state() -> Result<(), serde_json::Error> {
        let info: TrackerInfo = serde_json::from_value(json!({
            "url": "udp://tracker.example:1337/announce", "status": 2, "tier": 0,
            "num_seeds": 12, "msg": ""
        }))?;
        assert!(info.is_tracker());
        let tracker = info.into_tracker("h", 0);
        assert_eq!(tracker.host, "tracker.example");
        assert!(tracker.last_announce_succeeded);
        assert_eq!(tracker.seeder_count, 12);

        let dht: TrackerInfo = serde_json::from_value(json!({"url": "** [DHT] **", "tier": ""}))?;
        assert!(!dht.is_tracker());
        Ok(())
    }
}
