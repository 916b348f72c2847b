//! [`Provider`] implementation over the WebUI client.
//!
//! The WebUI addresses torrents by hash only. Hash-scoped reads (files,
//! trackers, peers) fan out one request per torrent.

use async_trait::async_trait;
use tracing::{debug, warn};
use transctl_core::{
    AddTorrent, AddedTorrent, ByteCount, ConfigStore, FileChanges, FilePriority, FreeSpace, Limit,
    Mode, Peer, Provider, ProviderError, ProviderResult, QueueMove, Rate, RemoteConfig, SessionConfig,
    SessionStats, StatsSnapshot, Status, Torrent, TorrentChanges, TorrentFile, TorrentIds,
    TorrentSource, Tracker,
};

use crate::client::QbitClient;
use crate::config::PreferencesBackend;
use crate::form::hashes;
use crate::request::{
    AddTrackers, ByHash, EditTracker, FilePrio, HashesAction, Plain, RemoveTrackers, RenameFile,
    SetLimit, SetLocation, SetSavePath, SetShareLimits, SyncTorrentPeers, Tags, TorrentsAdd,
    TorrentsDelete, TorrentsInfo,
};
use crate::wire::{
    FileInfo, MainData, PeersReply, TorrentInfo, TrackerInfo, TransferInfo, priority_code,
};

/// Protocol name used by the provider registry.
pub const PROVIDER_NAME: &str = "qbittorrent";

/// qBittorrent daemon driven over the WebUI API.
#[derive(Clone)]
pub struct QbitProvider {
    client: QbitClient,
}

impl QbitProvider {
    /// Open a session against the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn connect(config: &SessionConfig) -> ProviderResult<Self> {
        debug!(url = %config.url, "connecting to qbittorrent");
        Ok(Self::with_client(QbitClient::new(config)?))
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: QbitClient) -> Self {
        Self { client }
    }

    async fn info(&self, ids: &TorrentIds) -> ProviderResult<Vec<TorrentInfo>> {
        let request = match ids {
            TorrentIds::All => TorrentsInfo::all(),
            TorrentIds::RecentlyActive => TorrentsInfo::active(),
            TorrentIds::List(_) => TorrentsInfo::all().with_hashes(hashes(ids)?),
        };
        self.client.json(&request).await
    }

    /// Concrete hashes behind `ids`, asking the daemon for `All`/recent.
    async fn resolve(&self, ids: &TorrentIds) -> ProviderResult<Vec<String>> {
        match ids {
            TorrentIds::List(_) => hashes(ids),
            _ => Ok(self
                .info(ids)
                .await?
                .into_iter()
                .map(|info| info.hash)
                .collect()),
        }
    }

    async fn action(&self, path: &'static str, ids: &TorrentIds) -> ProviderResult<()> {
        debug!(path, ?ids, "torrent action");
        self.client
            .send(&HashesAction::new(path, hashes(ids)?))
            .await
    }

    /// Try the v5 endpoint first and fall back to the v4 name when the
    /// daemon does not know it.
    async fn versioned_action(
        &self,
        current: &'static str,
        legacy: &'static str,
        ids: &TorrentIds,
    ) -> ProviderResult<()> {
        match self.action(current, ids).await {
            Err(ProviderError::TorrentNotFound) => {
                debug!(current, legacy, "falling back to legacy endpoint");
                self.action(legacy, ids).await
            }
            other => other,
        }
    }

    async fn trackers_of(&self, hash: &str) -> ProviderResult<Vec<Tracker>> {
        let infos: Vec<TrackerInfo> = self.client.json(&ByHash::trackers(hash)).await?;
        Ok(infos
            .into_iter()
            .filter(TrackerInfo::is_tracker)
            .zip(0..)
            .map(|(info, id)| info.into_tracker(hash, id))
            .collect())
    }

    async fn files_of(&self, hash: &str) -> ProviderResult<Vec<TorrentFile>> {
        let infos: Vec<FileInfo> = self.client.json(&ByHash::files(hash)).await?;
        Ok(infos
            .into_iter()
            .enumerate()
            .map(|(position, info)| info.into_file(hash, position))
            .collect())
    }
}

fn unsupported_change(changes: &TorrentChanges) -> Option<&'static str> {
    if changes.bandwidth_priority.is_some() {
        Some("bandwidth priority")
    } else if changes.peer_limit.is_some() {
        Some("per-torrent peer limit")
    } else if changes.queue_position.is_some() {
        Some("queue position")
    } else if changes.honors_session_limits.is_some() {
        Some("honor session limits")
    } else {
        None
    }
}

/// Bytes per second for a limit change; zero lifts the limit.
fn limit_bytes(limit: Option<Limit>, limited: Option<bool>) -> Option<i64> {
    match (limit, limited) {
        (_, Some(false)) => Some(0),
        (Some(limit), _) => Some(limit.0.saturating_mul(1000)),
        (None, _) => None,
    }
}

fn share_limits(hashes: Vec<String>, changes: &TorrentChanges) -> Option<SetShareLimits> {
    let ratio = match (changes.seed_ratio_mode, changes.seed_ratio_limit) {
        (Some(Mode::Global), _) => Some(-2.0),
        (Some(Mode::Unlimited), _) => Some(-1.0),
        (_, Some(limit)) => Some(limit),
        (Some(Mode::Single) | None, None) => None,
    };
    let idle = match (changes.seed_idle_mode, changes.seed_idle_limit) {
        (Some(Mode::Global), _) => Some(-2),
        (Some(Mode::Unlimited), _) => Some(-1),
        (_, Some(minutes)) => Some(minutes),
        (Some(Mode::Single) | None, None) => None,
    };
    if ratio.is_none() && idle.is_none() {
        return None;
    }
    let mut request = SetShareLimits::new(hashes);
    if let Some(ratio) = ratio {
        request = request.with_ratio_limit(ratio);
    }
    if let Some(idle) = idle {
        request = request.with_inactive_limit(idle);
    }
    Some(request)
}

fn magnet_hash(link: &str) -> Option<String> {
    let url = url::Url::parse(link).ok()?;
    url.query_pairs()
        .filter(|(key, _)| key == "xt")
        .find_map(|(_, value)| value.strip_prefix("urn:btih:").map(str::to_lowercase))
}

#[async_trait]
impl Provider for QbitProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn add(&self, request: AddTorrent) -> ProviderResult<AddedTorrent> {
        if request.peer_limit.is_some() || request.bandwidth_priority.is_some() {
            warn!("qbittorrent ignores peer limit and bandwidth priority on add");
        }
        let (form, name, hash_string) = match request.source {
            TorrentSource::Url(url) => {
                let hash = magnet_hash(&url).unwrap_or_default();
                (TorrentsAdd::default().with_url(url.clone()), url, hash)
            }
            TorrentSource::File { name, bytes } => (
                TorrentsAdd::default().with_file(name.clone(), bytes),
                name,
                String::new(),
            ),
        };
        let form = form
            .with_save_path(request.download_dir)
            .with_paused(request.paused)
            .with_tags(request.labels);
        let body = self.client.execute(&form).await?;
        if String::from_utf8_lossy(&body).trim() == "Fails." {
            return Err(ProviderError::RequestFailed {
                result: "torrents/add: daemon rejected the torrent".to_string(),
            });
        }
        Ok(AddedTorrent {
            id: 0,
            name,
            hash_string,
            duplicate: false,
        })
    }

    async fn get(&self, ids: &TorrentIds, fields: &[&str]) -> ProviderResult<Vec<Torrent>> {
        debug!(?ids, fields = ?fields, "fetching torrents");
        Ok(self
            .info(ids)
            .await?
            .into_iter()
            .map(Torrent::from)
            .collect())
    }

    async fn remove(&self, ids: &TorrentIds, delete_local_data: bool) -> ProviderResult<()> {
        self.client
            .send(&TorrentsDelete::new(hashes(ids)?, delete_local_data))
            .await
    }

    async fn set(&self, ids: &TorrentIds, changes: &TorrentChanges) -> ProviderResult<()> {
        if let Some(operation) = unsupported_change(changes) {
            return Err(ProviderError::Unsupported { operation });
        }
        let targets = hashes(ids)?;
        if let Some(limit) = limit_bytes(changes.download_limit, changes.download_limited) {
            self.client
                .send(&SetLimit::download(targets.clone(), limit))
                .await?;
        }
        if let Some(limit) = limit_bytes(changes.upload_limit, changes.upload_limited) {
            self.client
                .send(&SetLimit::upload(targets.clone(), limit))
                .await?;
        }
        if let Some(request) = share_limits(targets.clone(), changes) {
            self.client.send(&request).await?;
        }
        if let Some(labels) = &changes.labels {
            self.client.send(&Tags::clear(targets.clone())).await?;
            if !labels.is_empty() {
                self.client.send(&Tags::add(targets, labels.clone())).await?;
            }
        }
        Ok(())
    }

    async fn start(&self, ids: &TorrentIds, now: bool) -> ProviderResult<()> {
        self.versioned_action("torrents/start", "torrents/resume", ids)
            .await?;
        if now {
            self.client
                .send(&HashesAction::new("torrents/setForceStart", hashes(ids)?))
                .await?;
        }
        Ok(())
    }

    async fn stop(&self, ids: &TorrentIds) -> ProviderResult<()> {
        self.versioned_action("torrents/stop", "torrents/pause", ids)
            .await
    }

    async fn move_location(
        &self,
        ids: &TorrentIds,
        location: &str,
        move_data: bool,
    ) -> ProviderResult<()> {
        let targets = hashes(ids)?;
        if move_data {
            self.client.send(&SetLocation::new(targets, location)).await
        } else {
            self.client.send(&SetSavePath::new(targets, location)).await
        }
    }

    async fn verify(&self, ids: &TorrentIds) -> ProviderResult<()> {
        self.action("torrents/recheck", ids).await
    }

    async fn reannounce(&self, ids: &TorrentIds) -> ProviderResult<()> {
        self.action("torrents/reannounce", ids).await
    }

    async fn queue_move(&self, ids: &TorrentIds, direction: QueueMove) -> ProviderResult<()> {
        let path = match direction {
            QueueMove::Top => "torrents/topPrio",
            QueueMove::Up => "torrents/increasePrio",
            QueueMove::Down => "torrents/decreasePrio",
            QueueMove::Bottom => "torrents/bottomPrio",
        };
        self.action(path, ids).await
    }

    async fn peers_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<Peer>> {
        let mut peers = Vec::new();
        for hash in self.resolve(ids).await? {
            let reply: PeersReply = self.client.json(&SyncTorrentPeers::new(&hash)).await?;
            peers.extend(
                reply
                    .peers
                    .into_values()
                    .enumerate()
                    .map(|(index, peer)| peer.into_peer(&hash, index)),
            );
        }
        Ok(peers)
    }

    async fn files_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<TorrentFile>> {
        let mut files = Vec::new();
        for hash in self.resolve(ids).await? {
            files.extend(self.files_of(&hash).await?);
        }
        Ok(files)
    }

    async fn files_set(&self, ids: &TorrentIds, changes: &FileChanges) -> ProviderResult<()> {
        let priority = match (changes.wanted, changes.priority) {
            (Some(false), _) => 0,
            (_, Some(priority)) => priority_code(priority),
            (Some(true), None) => priority_code(FilePriority::Normal),
            (None, None) => return Ok(()),
        };
        for hash in self.resolve(ids).await? {
            let indices = if changes.indices.is_empty() {
                self.files_of(&hash)
                    .await?
                    .into_iter()
                    .map(|file| file.index)
                    .collect()
            } else {
                changes.indices.clone()
            };
            if indices.is_empty() {
                continue;
            }
            self.client
                .send(&FilePrio::new(&hash, &indices, priority))
                .await?;
        }
        Ok(())
    }

    async fn files_rename(&self, hash: &str, path: &str, name: &str) -> ProviderResult<()> {
        let new_path = match path.rsplit_once('/') {
            Some((parent, _)) => format!("{parent}/{name}"),
            None => name.to_string(),
        };
        self.client
            .send(&RenameFile::new(hash, path, new_path))
            .await
    }

    async fn trackers_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<Tracker>> {
        let mut trackers = Vec::new();
        for hash in self.resolve(ids).await? {
            trackers.extend(self.trackers_of(&hash).await?);
        }
        Ok(trackers)
    }

    async fn trackers_add(&self, ids: &TorrentIds, urls: &[String]) -> ProviderResult<()> {
        for hash in self.resolve(ids).await? {
            self.client.send(&AddTrackers::new(&hash, urls)).await?;
        }
        Ok(())
    }

    async fn trackers_replace(&self, hash: &str, id: i64, url: &str) -> ProviderResult<()> {
        let current = self
            .trackers_of(hash)
            .await?
            .into_iter()
            .find(|tracker| tracker.id == id)
            .ok_or(ProviderError::TrackerNotFound { id })?;
        self.client
            .send(&EditTracker::new(hash, current.announce, url))
            .await
    }

    async fn trackers_remove(&self, hash: &str, ids: &[i64]) -> ProviderResult<()> {
        let trackers = self.trackers_of(hash).await?;
        let mut urls = Vec::with_capacity(ids.len());
        for id in ids {
            let tracker = trackers
                .iter()
                .find(|tracker| tracker.id == *id)
                .ok_or(ProviderError::TrackerNotFound { id: *id })?;
            urls.push(tracker.announce.clone());
        }
        self.client.send(&RemoveTrackers::new(hash, urls)).await
    }

    async fn stats(&self) -> ProviderResult<SessionStats> {
        let transfer: TransferInfo = self.client.json(&Plain::TRANSFER_INFO).await?;
        let main: MainData = self.client.json(&Plain::MAINDATA).await?;
        let torrents = self.get(&TorrentIds::All, &["status"]).await?;
        let paused = torrents
            .iter()
            .filter(|torrent| torrent.status == Some(Status::Stopped))
            .count();
        let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(SessionStats {
            active_torrent_count: count(torrents.len() - paused),
            paused_torrent_count: count(paused),
            torrent_count: count(torrents.len()),
            download_speed: Rate(transfer.dl_info_speed),
            upload_speed: Rate(transfer.up_info_speed),
            cumulative_stats: StatsSnapshot {
                uploaded_bytes: ByteCount(main.server_state.alltime_ul),
                downloaded_bytes: ByteCount(main.server_state.alltime_dl),
                ..StatsSnapshot::default()
            },
            current_stats: StatsSnapshot {
                uploaded_bytes: ByteCount(transfer.up_info_data),
                downloaded_bytes: ByteCount(transfer.dl_info_data),
                ..StatsSnapshot::default()
            },
        })
    }

    async fn shutdown(&self) -> ProviderResult<()> {
        self.client.send(&Plain::SHUTDOWN).await
    }

    async fn free_space(&self, path: &str) -> ProviderResult<FreeSpace> {
        let main: MainData = self.client.json(&Plain::MAINDATA).await?;
        Ok(FreeSpace {
            path: path.to_string(),
            size_bytes: ByteCount(main.server_state.free_space_on_disk),
            total_size: None,
        })
    }

    async fn remote_config(&self) -> ProviderResult<Box<dyn ConfigStore>> {
        Ok(Box::new(RemoteConfig::new(PreferencesBackend::new(
            self.client.clone(),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_convert_to_bytes_per_second() {
        assert_eq!(limit_bytes(Some(Limit(50)), None), Some(50_000));
        assert_eq!(limit_bytes(Some(Limit(50)), Some(false)), Some(0));
        assert_eq!(limit_bytes(None, Some(true)), None);
    }

    #[test]
    fn magnet_links_yield_their_hash() {
        assert_eq!(
            magnet_hash("magnet:?xt=urn:btih:ABCDEF0123&dn=iso").as_deref(),
            Some("abcdef0123")
        );
        assert_eq!(magnet_hash("https://example.org/a.torrent"), None);
    }

    #[test]
    fn unsupported_changes_are_named() {
        let changes = TorrentChanges {
            peer_limit: Some(20),
            ..TorrentChanges::default()
        };
        assert_eq!(unsupported_change(&changes), Some("per-torrent peer limit"));
    }
}
