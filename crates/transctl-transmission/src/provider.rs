//! [`Provider`] implementation over the RPC client.

use async_trait::async_trait;
use tracing::debug;
use transctl_core::{
    AddTorrent, AddedTorrent, ByteCount, ConfigStore, FileChanges, FreeSpace, Peer, Provider,
    ProviderError, ProviderResult, QueueMove, RemoteConfig, SessionConfig, SessionStats, Torrent,
    TorrentChanges, TorrentFile, TorrentIds, Tracker,
};

use crate::client::{NoArguments, TransmissionClient};
use crate::config::SessionBackend;
use crate::request::{
    BlocklistReply, FreeSpaceRequest, PortTestReply, TorrentAction, TorrentAdd, TorrentAddReply,
    TorrentDetails, TorrentGet, TorrentList, TorrentRemove, TorrentRenamePath, TorrentSet,
    TorrentSetLocation,
};

/// Protocol name used by the provider registry.
pub const PROVIDER_NAME: &str = "transmission";

/// Transmission daemon driven over JSON-RPC.
#[derive(Clone)]
pub struct TransmissionProvider {
    client: TransmissionClient,
}

impl TransmissionProvider {
    /// Open a session against the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn connect(config: &SessionConfig) -> ProviderResult<Self> {
        debug!(url = %config.url, "connecting to transmission");
        Ok(Self::with_client(TransmissionClient::new(config)?))
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: TransmissionClient) -> Self {
        Self { client }
    }

    async fn details(&self, ids: &TorrentIds, fields: &[&str]) -> ProviderResult<Vec<TorrentDetails>> {
        let request = TorrentGet::new()
            .with_ids(ids.clone())
            .with_fields(["hashString"])
            .with_fields(fields.iter().copied());
        let reply: TorrentList<TorrentDetails> = self.client.call("torrent-get", &request).await?;
        Ok(reply.torrents)
    }

    async fn action(&self, method: &'static str, ids: &TorrentIds) -> ProviderResult<()> {
        debug!(method, ?ids, "torrent action");
        self.client
            .call::<_, serde_json::Value>(method, &TorrentAction::new(ids.clone()))
            .await
            .map(drop)
    }

    async fn torrent_set(&self, request: &TorrentSet) -> ProviderResult<()> {
        self.client
            .call::<_, serde_json::Value>("torrent-set", request)
            .await
            .map(drop)
    }
}

fn files_of(details: TorrentDetails) -> impl Iterator<Item = TorrentFile> {
    let hash = details.hash_string;
    let mut stats = details.file_stats.into_iter();
    details
        .files
        .into_iter()
        .enumerate()
        .map(move |(index, file)| {
            let stat = stats.next().unwrap_or_default();
            TorrentFile {
                hash_string: hash.clone(),
                index,
                name: file.name,
                length: ByteCount(file.length),
                bytes_completed: ByteCount(file.bytes_completed),
                wanted: stat.wanted,
                priority: stat.priority,
            }
        })
}

#[async_trait]
impl Provider for TransmissionProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn add(&self, request: AddTorrent) -> ProviderResult<AddedTorrent> {
        let reply: TorrentAddReply = self
            .client
            .call("torrent-add", &TorrentAdd::from(request))
            .await?;
        reply.into_added().ok_or_else(|| ProviderError::RequestFailed {
            result: "torrent-add returned no torrent".to_string(),
        })
    }

    async fn get(&self, ids: &TorrentIds, fields: &[&str]) -> ProviderResult<Vec<Torrent>> {
        let request = TorrentGet::new()
            .with_ids(ids.clone())
            .with_fields(["hashString"])
            .with_fields(fields.iter().copied());
        debug!(?ids, fields = ?fields, "fetching torrents");
        let reply: TorrentList<Torrent> = self.client.call("torrent-get", &request).await?;
        Ok(reply.torrents)
    }

    async fn remove(&self, ids: &TorrentIds, delete_local_data: bool) -> ProviderResult<()> {
        let request = TorrentRemove::new(ids.clone()).with_delete_local_data(delete_local_data);
        self.client
            .call::<_, serde_json::Value>("torrent-remove", &request)
            .await
            .map(drop)
    }

    async fn set(&self, ids: &TorrentIds, changes: &TorrentChanges) -> ProviderResult<()> {
        self.torrent_set(&TorrentSet::new(ids.clone()).with_changes(changes))
            .await
    }

    async fn start(&self, ids: &TorrentIds, now: bool) -> ProviderResult<()> {
        let method = if now { "torrent-start-now" } else { "torrent-start" };
        self.action(method, ids).await
    }

    async fn stop(&self, ids: &TorrentIds) -> ProviderResult<()> {
        self.action("torrent-stop", ids).await
    }

    async fn move_location(
        &self,
        ids: &TorrentIds,
        location: &str,
        move_data: bool,
    ) -> ProviderResult<()> {
        let request = TorrentSetLocation::new(ids.clone(), location).with_move(move_data);
        self.client
            .call::<_, serde_json::Value>("torrent-set-location", &request)
            .await
            .map(drop)
    }

    async fn verify(&self, ids: &TorrentIds) -> ProviderResult<()> {
        self.action("torrent-verify", ids).await
    }

    async fn reannounce(&self, ids: &TorrentIds) -> ProviderResult<()> {
        self.action("torrent-reannounce", ids).await
    }

    async fn queue_move(&self, ids: &TorrentIds, direction: QueueMove) -> ProviderResult<()> {
        let method = match direction {
            QueueMove::Top => "queue-move-top",
            QueueMove::Up => "queue-move-up",
            QueueMove::Down => "queue-move-down",
            QueueMove::Bottom => "queue-move-bottom",
        };
        self.action(method, ids).await
    }

    async fn peers_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<Peer>> {
        let details = self.details(ids, &["peers"]).await?;
        Ok(details
            .into_iter()
            .flat_map(|torrent| {
                let hash = torrent.hash_string;
                torrent
                    .peers
                    .into_iter()
                    .enumerate()
                    .map(move |(index, peer)| Peer {
                        hash_string: hash.clone(),
                        index,
                        ..peer
                    })
            })
            .collect())
    }

    async fn files_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<TorrentFile>> {
        let details = self.details(ids, &["files", "fileStats"]).await?;
        Ok(details.into_iter().flat_map(files_of).collect())
    }

    async fn files_set(&self, ids: &TorrentIds, changes: &FileChanges) -> ProviderResult<()> {
        self.torrent_set(&TorrentSet::new(ids.clone()).with_files(changes))
            .await
    }

    async fn files_rename(&self, hash: &str, path: &str, name: &str) -> ProviderResult<()> {
        self.client
            .call::<_, serde_json::Value>(
                "torrent-rename-path",
                &TorrentRenamePath::new(hash, path, name),
            )
            .await
            .map(drop)
    }

    async fn trackers_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<Tracker>> {
        let details = self.details(ids, &["trackerStats"]).await?;
        Ok(details
            .into_iter()
            .flat_map(|torrent| {
                let hash = torrent.hash_string;
                torrent.tracker_stats.into_iter().map(move |tracker| Tracker {
                    hash_string: hash.clone(),
                    ..tracker
                })
            })
            .collect())
    }

    async fn trackers_add(&self, ids: &TorrentIds, urls: &[String]) -> ProviderResult<()> {
        self.torrent_set(&TorrentSet::new(ids.clone()).with_tracker_add(urls))
            .await
    }

    async fn trackers_replace(&self, hash: &str, id: i64, url: &str) -> ProviderResult<()> {
        self.torrent_set(&TorrentSet::new(TorrentIds::hashes([hash])).with_tracker_replace(id, url))
            .await
    }

    async fn trackers_remove(&self, hash: &str, ids: &[i64]) -> ProviderResult<()> {
        self.torrent_set(&TorrentSet::new(TorrentIds::hashes([hash])).with_tracker_remove(ids))
            .await
    }

    async fn stats(&self) -> ProviderResult<SessionStats> {
        self.client.call("session-stats", &NoArguments {}).await
    }

    async fn shutdown(&self) -> ProviderResult<()> {
        self.client
            .call::<_, serde_json::Value>("session-close", &NoArguments {})
            .await
            .map(drop)
    }

    async fn free_space(&self, path: &str) -> ProviderResult<FreeSpace> {
        self.client
            .call("free-space", &FreeSpaceRequest::new(path))
            .await
    }

    async fn blocklist_update(&self) -> ProviderResult<i64> {
        let reply: BlocklistReply = self
            .client
            .call("blocklist-update", &NoArguments {})
            .await?;
        Ok(reply.size)
    }

    async fn port_test(&self) -> ProviderResult<bool> {
        let reply: PortTestReply = self.client.call("port-test", &NoArguments {}).await?;
        Ok(reply.open)
    }

    async fn remote_config(&self) -> ProviderResult<Box<dyn ConfigStore>> {
        Ok(Box::new(RemoteConfig::new(SessionBackend::new(
            self.client.clone(),
        ))))
    }
}
