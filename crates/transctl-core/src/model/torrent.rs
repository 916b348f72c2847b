//! The torrent record, keyed by its content hash.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::enums::{Mode, Priority, Status};
use crate::model::short_hash;
use crate::record::{Column, Record};
use crate::units::{BoolInt, ByteCount, Eta, Limit, Percent, Rate, Timestamp};

/// A projection of one torrent's daemon state.
///
/// Field names follow Transmission's `torrent-get` vocabulary; every field is
/// optional because only the requested subset is fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Torrent {
    /// Daemon-local numeric id (unstable across restarts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// 40-hex content hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_string: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Activity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Estimated time remaining.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<Eta>,
    /// Current download rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_download: Option<Rate>,
    /// Current upload rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_upload: Option<Rate>,
    /// Verified bytes on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub have_valid: Option<ByteCount>,
    /// Completion of the wanted files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_done: Option<Percent>,
    /// Size of every file in the torrent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<ByteCount>,
    /// Size of the wanted files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_when_done: Option<ByteCount>,
    /// Bytes still needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_until_done: Option<ByteCount>,
    /// Bytes downloaded over the torrent's lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_ever: Option<ByteCount>,
    /// Bytes uploaded over the torrent's lifetime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_ever: Option<ByteCount>,
    /// Share ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_ratio: Option<f64>,
    /// When the torrent was added.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_date: Option<Timestamp>,
    /// When the download completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_date: Option<Timestamp>,
    /// Last transfer activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_date: Option<Timestamp>,
    /// Directory holding the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
    /// Error code (0 when healthy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<i64>,
    /// Error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_string: Option<String>,
    /// Connected peer count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peers_connected: Option<i64>,
    /// Position in the download/seed queue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<i64>,
    /// User labels (qBittorrent tags).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Bandwidth priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_priority: Option<Priority>,
    /// Download limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_limit: Option<Limit>,
    /// Whether the download limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_limited: Option<BoolInt>,
    /// Upload limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_limit: Option<Limit>,
    /// Whether the upload limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_limited: Option<BoolInt>,
    /// Seed ratio stop criterion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_ratio_limit: Option<f64>,
    /// Which ratio limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_ratio_mode: Option<Mode>,
    /// Idle minutes before seeding stops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_idle_limit: Option<i64>,
    /// Which idle limit applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_idle_mode: Option<Mode>,
    /// Whether session limits also apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honors_session_limits: Option<BoolInt>,
    /// Maximum connected peers.
    #[serde(rename = "peer-limit", skip_serializing_if = "Option::is_none")]
    pub peer_limit: Option<i64>,
    /// Whether the download finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_finished: Option<BoolInt>,
    /// Whether the torrent is private.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<BoolInt>,
    /// Magnet link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
    /// Creator comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Torrent {
    /// Content hash, empty when not fetched.
    #[must_use]
    pub fn hash(&self) -> &str {
        self.hash_string.as_deref().unwrap_or_default()
    }
}

fn text(value: Option<&String>) -> Cell {
    Cell::from_option(value.cloned(), Cell::Text)
}

fn int(value: Option<i64>) -> Cell {
    Cell::from_option(value, Cell::Int)
}

fn flag(value: Option<BoolInt>) -> Cell {
    Cell::from_option(value, |value| Cell::Bool(value.0))
}

fn time(value: Option<Timestamp>) -> Cell {
    Cell::from_option(value, Cell::Time)
}

fn bytes(value: Option<ByteCount>) -> Cell {
    Cell::from_option(value, Cell::Bytes)
}

fn mode(value: Option<Mode>) -> Cell {
    Cell::from_option(value, |mode| Cell::Enum(mode.code(), mode.label()))
}

impl Record for Torrent {
    const KIND: &'static str = "torrent";
    const GROUP: &'static str = "torrents";

    fn columns() -> Vec<Column<Self>> {
        let col = Column::<Self>::new;
        vec![
            col("id", &["id"], |t| int(t.id)),
            col("hashString", &["hashString"], |t| text(t.hash_string.as_ref())),
            col("shortHash", &["hashString"], |t| {
                Cell::from_option(t.hash_string.as_deref(), |hash| Cell::Text(short_hash(hash)))
            }),
            col("name", &["name"], |t| text(t.name.as_ref())),
            col("status", &["status"], |t| {
                Cell::from_option(t.status, |status| Cell::Enum(status.code(), status.label()))
            }),
            col("eta", &["eta"], |t| Cell::from_option(t.eta, Cell::Eta)),
            col("rateDownload", &["rateDownload"], |t| {
                Cell::from_option(t.rate_download, Cell::Rate)
            }),
            col("rateUpload", &["rateUpload"], |t| {
                Cell::from_option(t.rate_upload, Cell::Rate)
            }),
            col("haveValid", &["haveValid"], |t| bytes(t.have_valid)),
            col("percentDone", &["percentDone"], |t| {
                Cell::from_option(t.percent_done, Cell::Percent)
            }),
            col("totalSize", &["totalSize"], |t| bytes(t.total_size)),
            col("sizeWhenDone", &["sizeWhenDone"], |t| bytes(t.size_when_done)),
            col("leftUntilDone", &["leftUntilDone"], |t| bytes(t.left_until_done)),
            col("downloadedEver", &["downloadedEver"], |t| bytes(t.downloaded_ever)),
            col("uploadedEver", &["uploadedEver"], |t| bytes(t.uploaded_ever)),
            col("uploadRatio", &["uploadRatio"], |t| {
                Cell::from_option(t.upload_ratio, Cell::Float)
            }),
            col("addedDate", &["addedDate"], |t| time(t.added_date)),
            col("doneDate", &["doneDate"], |t| time(t.done_date)),
            col("activityDate", &["activityDate"], |t| time(t.activity_date)),
            col("downloadDir", &["downloadDir"], |t| text(t.download_dir.as_ref())),
            col("error", &["error"], |t| int(t.error)),
            col("errorString", &["errorString"], |t| text(t.error_string.as_ref())),
            col("peersConnected", &["peersConnected"], |t| int(t.peers_connected)),
            col("queuePosition", &["queuePosition"], |t| int(t.queue_position)),
            col("labels", &["labels"], |t| {
                Cell::from_option(t.labels.as_ref(), |labels| Cell::Text(labels.join(",")))
            }),
            col("bandwidthPriority", &["bandwidthPriority"], |t| {
                Cell::from_option(t.bandwidth_priority, |p| Cell::Enum(p.code(), p.label()))
            }),
            col("downloadLimit", &["downloadLimit"], |t| {
                Cell::from_option(t.download_limit, Cell::Limit)
            }),
            col("downloadLimited", &["downloadLimited"], |t| flag(t.download_limited)),
            col("uploadLimit", &["uploadLimit"], |t| {
                Cell::from_option(t.upload_limit, Cell::Limit)
            }),
            col("uploadLimited", &["uploadLimited"], |t| flag(t.upload_limited)),
            col("seedRatioLimit", &["seedRatioLimit"], |t| {
                Cell::from_option(t.seed_ratio_limit, Cell::Float)
            }),
            col("seedRatioMode", &["seedRatioMode"], |t| mode(t.seed_ratio_mode)),
            col("seedIdleLimit", &["seedIdleLimit"], |t| int(t.seed_idle_limit)),
            col("seedIdleMode", &["seedIdleMode"], |t| mode(t.seed_idle_mode)),
            col("honorsSessionLimits", &["honorsSessionLimits"], |t| {
                flag(t.honors_session_limits)
            }),
            col("peer-limit", &["peer-limit"], |t| int(t.peer_limit)),
            col("isFinished", &["isFinished"], |t| flag(t.is_finished)),
            col("isPrivate", &["isPrivate"], |t| flag(t.is_private)),
            col("magnetLink", &["magnetLink"], |t| text(t.magnet_link.as_ref())),
            col("comment", &["comment"], |t| text(t.comment.as_ref())),
        ]
    }

    fn index_key(&self) -> String {
        self.hash().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_partial_projection() -> Result<(), serde_json::Error> {
        let torrent: Torrent = serde_json::from_str(
            r#"{"hashString":"abcdef0123456789","haveValid":1024,"status":4,"eta":-1}"#,
        )?;
        assert_eq!(torrent.hash(), "abcdef0123456789");
        assert_eq!(torrent.value_of("shortHash"), Cell::Text("abcdef0".into()));
        assert_eq!(torrent.value_of("eta"), Cell::Eta(Eta::Done));
        assert_eq!(torrent.value_of("name"), Cell::Empty);
        Ok(())
    }

    #[test]
    fn serializes_only_fetched_fields() -> Result<(), serde_json::Error> {
        let torrent = Torrent {
            hash_string: Some("aa".into()),
            have_valid: Some(ByteCount(5)),
            ..Torrent::default()
        };
        assert_eq!(
            serde_json::to_string(&torrent)?,
            r#"{"hashString":"aa","haveValid":5}"#
        );
        Ok(())
    }

    #[test]
    fn virtual_short_hash_fetches_hash_string() {
        let column = Torrent::column("shortHash").expect("column exists");
        assert_eq!(column.fields, &["hashString"]);
    }
}
