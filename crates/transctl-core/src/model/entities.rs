//! Per-torrent sub-entities: files, peers, and trackers.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::enums::{FilePriority, TrackerState};
use crate::model::short_hash;
use crate::record::{Column, Record};
use crate::units::{ByteCount, Percent, Rate, Timestamp};

/// One file inside a torrent, keyed by `(hash_string, index)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentFile {
    /// Hash of the owning torrent.
    pub hash_string: String,
    /// Position of the file within the torrent.
    pub index: usize,
    /// Path relative to the download directory.
    pub name: String,
    /// File size.
    pub length: ByteCount,
    /// Bytes downloaded and verified.
    pub bytes_completed: ByteCount,
    /// Whether the file is selected for download.
    pub wanted: bool,
    /// Download priority.
    pub priority: FilePriority,
}

impl TorrentFile {
    /// Completion of this file; 1.0 for empty files.
    #[must_use]
    pub fn percent_done(&self) -> Percent {
        Percent::of(self.bytes_completed.0, self.length.0)
    }
}

impl Record for TorrentFile {
    const KIND: &'static str = "file";
    const GROUP: &'static str = "files";

    fn columns() -> Vec<Column<Self>> {
        let col = Column::<Self>::new;
        vec![
            col("hashString", &["hashString"], |f| Cell::Text(f.hash_string.clone())),
            col("shortHash", &["hashString"], |f| Cell::Text(short_hash(&f.hash_string))),
            col("index", &["files"], |f| Cell::Int(i64::try_from(f.index).unwrap_or(i64::MAX))),
            col("name", &["files"], |f| Cell::Text(f.name.clone())),
            col("length", &["files"], |f| Cell::Bytes(f.length)),
            col("bytesCompleted", &["files"], |f| Cell::Bytes(f.bytes_completed)),
            col("percentDone", &["files"], |f| Cell::Percent(f.percent_done())),
            col("wanted", &["fileStats"], |f| Cell::Bool(f.wanted)),
            col("priority", &["fileStats"], |f| {
                Cell::Enum(f.priority.code(), f.priority.label())
            }),
        ]
    }

    fn index_key(&self) -> String {
        self.hash_string.clone()
    }

    fn sub_index(&self) -> Option<String> {
        Some(self.index.to_string())
    }
}

/// One connected peer. Peers have no identity across polls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Peer {
    /// Hash of the owning torrent.
    pub hash_string: String,
    /// Position in the current poll.
    pub index: usize,
    /// Remote address.
    pub address: String,
    /// Remote port.
    pub port: u16,
    /// Client software name.
    pub client_name: String,
    /// Whether the connection is encrypted.
    pub is_encrypted: bool,
    /// Whether the connection uses uTP.
    #[serde(rename = "isUTP")]
    pub is_utp: bool,
    /// Whether the peer connected to us.
    pub is_incoming: bool,
    /// Remote completion.
    pub progress: Percent,
    /// Rate from the peer to us.
    pub rate_to_client: Rate,
    /// Rate from us to the peer.
    pub rate_to_peer: Rate,
    /// We are choking the peer.
    pub peer_is_choked: bool,
    /// The peer is interested in us.
    pub peer_is_interested: bool,
    /// The peer is choking us.
    pub client_is_choked: bool,
    /// We are interested in the peer.
    pub client_is_interested: bool,
    /// Compact flag string as reported by the daemon.
    pub flag_str: String,
}

impl Record for Peer {
    const KIND: &'static str = "peer";
    const GROUP: &'static str = "peers";

    fn columns() -> Vec<Column<Self>> {
        let col = Column::<Self>::new;
        vec![
            col("hashString", &["hashString"], |p| Cell::Text(p.hash_string.clone())),
            col("shortHash", &["hashString"], |p| Cell::Text(short_hash(&p.hash_string))),
            col("address", &["peers"], |p| Cell::Text(p.address.clone())),
            col("port", &["peers"], |p| Cell::Int(i64::from(p.port))),
            col("clientName", &["peers"], |p| Cell::Text(p.client_name.clone())),
            col("isEncrypted", &["peers"], |p| Cell::Bool(p.is_encrypted)),
            col("isUTP", &["peers"], |p| Cell::Bool(p.is_utp)),
            col("isIncoming", &["peers"], |p| Cell::Bool(p.is_incoming)),
            col("progress", &["peers"], |p| Cell::Percent(p.progress)),
            col("rateToClient", &["peers"], |p| Cell::Rate(p.rate_to_client)),
            col("rateToPeer", &["peers"], |p| Cell::Rate(p.rate_to_peer)),
            col("peerIsChoked", &["peers"], |p| Cell::Bool(p.peer_is_choked)),
            col("peerIsInterested", &["peers"], |p| Cell::Bool(p.peer_is_interested)),
            col("clientIsChoked", &["peers"], |p| Cell::Bool(p.client_is_choked)),
            col("clientIsInterested", &["peers"], |p| Cell::Bool(p.client_is_interested)),
            col("flagStr", &["peers"], |p| Cell::Text(p.flag_str.clone())),
        ]
    }

    fn index_key(&self) -> String {
        self.hash_string.clone()
    }

    fn sub_index(&self) -> Option<String> {
        Some(self.index.to_string())
    }
}

/// One tracker of a torrent with its announce/scrape statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tracker {
    /// Hash of the owning torrent.
    pub hash_string: String,
    /// Provider-assigned identifier within the torrent.
    pub id: i64,
    /// Announce URL.
    pub announce: String,
    /// Scrape URL.
    pub scrape: String,
    /// Tier.
    pub tier: i64,
    /// Host and port of the announce URL.
    pub host: String,
    /// Announce state.
    pub announce_state: Option<TrackerState>,
    /// Scrape state.
    pub scrape_state: Option<TrackerState>,
    /// Result of the last announce.
    pub last_announce_result: String,
    /// Whether the last announce succeeded.
    pub last_announce_succeeded: bool,
    /// Time of the last announce.
    pub last_announce_time: Timestamp,
    /// Time of the next announce.
    pub next_announce_time: Timestamp,
    /// Result of the last scrape.
    pub last_scrape_result: String,
    /// Time of the last scrape.
    pub last_scrape_time: Timestamp,
    /// Time of the next scrape.
    pub next_scrape_time: Timestamp,
    /// Peers returned by the last announce.
    pub last_announce_peer_count: i64,
    /// Seeders reported by the tracker.
    pub seeder_count: i64,
    /// Leechers reported by the tracker.
    pub leecher_count: i64,
    /// Completed downloads reported by the tracker.
    pub download_count: i64,
}

fn state(value: Option<TrackerState>) -> Cell {
    Cell::from_option(value, |state| Cell::Enum(state.code(), state.label()))
}

impl Record for Tracker {
    const KIND: &'static str = "tracker";
    const GROUP: &'static str = "trackers";

    fn columns() -> Vec<Column<Self>> {
        let col = Column::<Self>::new;
        vec![
            col("hashString", &["hashString"], |t| Cell::Text(t.hash_string.clone())),
            col("shortHash", &["hashString"], |t| Cell::Text(short_hash(&t.hash_string))),
            col("id", &["trackerStats"], |t| Cell::Int(t.id)),
            col("tier", &["trackerStats"], |t| Cell::Int(t.tier)),
            col("host", &["trackerStats"], |t| Cell::Text(t.host.clone())),
            col("announce", &["trackerStats"], |t| Cell::Text(t.announce.clone())),
            col("scrape", &["trackerStats"], |t| Cell::Text(t.scrape.clone())),
            col("announceState", &["trackerStats"], |t| state(t.announce_state)),
            col("scrapeState", &["trackerStats"], |t| state(t.scrape_state)),
            col("lastAnnounceResult", &["trackerStats"], |t| {
                Cell::Text(t.last_announce_result.clone())
            }),
            col("lastAnnounceSucceeded", &["trackerStats"], |t| {
                Cell::Bool(t.last_announce_succeeded)
            }),
            col("lastAnnounceTime", &["trackerStats"], |t| Cell::Time(t.last_announce_time)),
            col("nextAnnounceTime", &["trackerStats"], |t| Cell::Time(t.next_announce_time)),
            col("lastScrapeResult", &["trackerStats"], |t| {
                Cell::Text(t.last_scrape_result.clone())
            }),
            col("lastScrapeTime", &["trackerStats"], |t| Cell::Time(t.last_scrape_time)),
            col("nextScrapeTime", &["trackerStats"], |t| Cell::Time(t.next_scrape_time)),
            col("lastAnnouncePeerCount", &["trackerStats"], |t| {
                Cell::Int(t.last_announce_peer_count)
            }),
            col("seederCount", &["trackerStats"], |t| Cell::Int(t.seeder_count)),
            col("leecherCount", &["trackerStats"], |t| Cell::Int(t.leecher_count)),
            col("downloadCount", &["trackerStats"], |t| Cell::Int(t.download_count)),
        ]
    }

    fn index_key(&self) -> String {
        self.hash_string.clone()
    }

    fn sub_index(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_counts_as_complete() {
        let file = TorrentFile {
            length: ByteCount(0),
            ..TorrentFile::default()
        };
        assert!((file.percent_done().0 - 1.0).abs() < f64::EPSILON);
        let half = TorrentFile {
            length: ByteCount(10),
            bytes_completed: ByteCount(5),
            ..TorrentFile::default()
        };
        assert_eq!(half.value_of("percentDone"), Cell::Percent(Percent(0.5)));
    }

    #[test]
    fn tracker_stats_decode_states() -> Result<(), serde_json::Error> {
        let tracker: Tracker = serde_json::from_str(
            r#"{"id":3,"announce":"http://t/a","tier":0,"announceState":1,"seederCount":9}"#,
        )?;
        assert_eq!(tracker.announce_state, Some(TrackerState::Waiting));
        assert_eq!(tracker.sub_index().as_deref(), Some("3"));
        Ok(())
    }

    #[test]
    fn peer_decodes_transport_flag() -> Result<(), serde_json::Error> {
        let peer: Peer = serde_json::from_str(
            r#"{"address":"10.0.0.1","port":51413,"isUTP":true,"rateToClient":100}"#,
        )?;
        assert!(peer.is_utp);
        assert_eq!(peer.rate_to_client, Rate(100));
        Ok(())
    }
}
