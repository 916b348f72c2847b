//! Session-wide records: transfer statistics and free space.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::record::{Column, Record};
use crate::units::{ByteCount, Rate};

/// Cumulative or current-session transfer counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSnapshot {
    /// Bytes uploaded.
    pub uploaded_bytes: ByteCount,
    /// Bytes downloaded.
    pub downloaded_bytes: ByteCount,
    /// Torrents added.
    pub files_added: i64,
    /// Daemon sessions started.
    pub session_count: i64,
    /// Seconds the daemon was active.
    pub seconds_active: i64,
}

/// Daemon-wide transfer statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    /// Torrents currently transferring.
    pub active_torrent_count: i64,
    /// Torrents currently paused.
    pub paused_torrent_count: i64,
    /// Torrents known to the daemon.
    pub torrent_count: i64,
    /// Aggregate download rate.
    pub download_speed: Rate,
    /// Aggregate upload rate.
    pub upload_speed: Rate,
    /// Totals across daemon restarts.
    #[serde(rename = "cumulative-stats")]
    pub cumulative_stats: StatsSnapshot,
    /// Totals since the daemon started.
    #[serde(rename = "current-stats")]
    pub current_stats: StatsSnapshot,
}

impl Record for SessionStats {
    const KIND: &'static str = "session";
    const GROUP: &'static str = "sessions";

    fn columns() -> Vec<Column<Self>> {
        let col = Column::<Self>::new;
        vec![
            col("activeTorrentCount", &["activeTorrentCount"], |s| {
                Cell::Int(s.active_torrent_count)
            }),
            col("pausedTorrentCount", &["pausedTorrentCount"], |s| {
                Cell::Int(s.paused_torrent_count)
            }),
            col("torrentCount", &["torrentCount"], |s| Cell::Int(s.torrent_count)),
            col("downloadSpeed", &["downloadSpeed"], |s| Cell::Rate(s.download_speed)),
            col("uploadSpeed", &["uploadSpeed"], |s| Cell::Rate(s.upload_speed)),
            col("downloadedBytes", &["current-stats"], |s| {
                Cell::Bytes(s.current_stats.downloaded_bytes)
            }),
            col("uploadedBytes", &["current-stats"], |s| {
                Cell::Bytes(s.current_stats.uploaded_bytes)
            }),
            col("secondsActive", &["current-stats"], |s| {
                Cell::Int(s.current_stats.seconds_active)
            }),
            col("cumulativeDownloadedBytes", &["cumulative-stats"], |s| {
                Cell::Bytes(s.cumulative_stats.downloaded_bytes)
            }),
            col("cumulativeUploadedBytes", &["cumulative-stats"], |s| {
                Cell::Bytes(s.cumulative_stats.uploaded_bytes)
            }),
            col("sessionCount", &["cumulative-stats"], |s| {
                Cell::Int(s.cumulative_stats.session_count)
            }),
        ]
    }

    fn index_key(&self) -> String {
        "session".to_string()
    }
}

/// Free space reported for one directory on the daemon host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeSpace {
    /// Queried directory.
    pub path: String,
    /// Bytes available.
    #[serde(rename = "size-bytes")]
    pub size_bytes: ByteCount,
    /// Size of the filesystem, when the daemon reports it.
    #[serde(rename = "total_size", skip_serializing_if = "Option::is_none")]
    pub total_size: Option<ByteCount>,
}

impl Record for FreeSpace {
    const KIND: &'static str = "free-space";
    const GROUP: &'static str = "free-space";

    fn columns() -> Vec<Column<Self>> {
        let col = Column::<Self>::new;
        vec![
            col("path", &["path"], |f| Cell::Text(f.path.clone())),
            col("sizeBytes", &["size-bytes"], |f| Cell::Bytes(f.size_bytes)),
            col("totalSize", &["total_size"], |f| {
                Cell::from_option(f.total_size, Cell::Bytes)
            }),
        ]
    }

    fn index_key(&self) -> String {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_decode_nested_snapshots() -> Result<(), serde_json::Error> {
        let stats: SessionStats = serde_json::from_str(
            r#"{"activeTorrentCount":2,"downloadSpeed":512,
                "current-stats":{"downloadedBytes":4096,"uploadedBytes":1},
                "cumulative-stats":{"sessionCount":7}}"#,
        )?;
        assert_eq!(stats.value_of("downloadedBytes"), Cell::Bytes(ByteCount(4096)));
        assert_eq!(stats.value_of("sessionCount"), Cell::Int(7));
        assert_eq!(stats.index_key(), "session");
        Ok(())
    }

    #[test]
    fn free_space_uses_daemon_field_names() -> Result<(), serde_json::Error> {
        let space: FreeSpace =
            serde_json::from_str(r#"{"path":"/data","size-bytes":1500000000}"#)?;
        assert_eq!(space.size_bytes, ByteCount(1_500_000_000));
        assert_eq!(space.total_size, None);
        Ok(())
    }
}
