//! The capability set every daemon client implements.

use async_trait::async_trait;

use crate::error::{ProviderError, ProviderResult};
use crate::model::{
    AddTorrent, AddedTorrent, FileChanges, FreeSpace, Peer, QueueMove, SessionStats, Torrent,
    TorrentChanges, TorrentFile, TorrentIds, Tracker,
};
use crate::remote::ConfigStore;

/// A live session against one remote daemon.
///
/// Torrent-addressing operations receive hash-based [`TorrentIds`]; only
/// [`Provider::get`] is expected to see numeric ids or
/// [`TorrentIds::RecentlyActive`]. Operations without a counterpart on a
/// daemon keep the default body and fail with [`ProviderError::Unsupported`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Protocol name the provider registers under.
    fn name(&self) -> &'static str;

    /// Add one torrent.
    async fn add(&self, request: AddTorrent) -> ProviderResult<AddedTorrent>;

    /// Fetch torrents, populating at least the requested wire `fields`.
    async fn get(&self, ids: &TorrentIds, fields: &[&str]) -> ProviderResult<Vec<Torrent>>;

    /// Remove torrents, optionally deleting their payload.
    async fn remove(&self, ids: &TorrentIds, delete_local_data: bool) -> ProviderResult<()>;

    /// Change per-torrent settings.
    async fn set(&self, ids: &TorrentIds, changes: &TorrentChanges) -> ProviderResult<()> {
        let _ = (ids, changes);
        Err(ProviderError::Unsupported { operation: "set" })
    }

    /// Start torrents, bypassing the queue when `now` is set.
    async fn start(&self, ids: &TorrentIds, now: bool) -> ProviderResult<()> {
        let _ = (ids, now);
        Err(ProviderError::Unsupported { operation: "start" })
    }

    /// Stop torrents.
    async fn stop(&self, ids: &TorrentIds) -> ProviderResult<()> {
        let _ = ids;
        Err(ProviderError::Unsupported { operation: "stop" })
    }

    /// Point torrents at a new location, moving data when `move_data` is set.
    async fn move_location(
        &self,
        ids: &TorrentIds,
        location: &str,
        move_data: bool,
    ) -> ProviderResult<()> {
        let _ = (ids, location, move_data);
        Err(ProviderError::Unsupported { operation: "move" })
    }

    /// Re-verify local data.
    async fn verify(&self, ids: &TorrentIds) -> ProviderResult<()> {
        let _ = ids;
        Err(ProviderError::Unsupported { operation: "verify" })
    }

    /// Announce to trackers now.
    async fn reannounce(&self, ids: &TorrentIds) -> ProviderResult<()> {
        let _ = ids;
        Err(ProviderError::Unsupported {
            operation: "reannounce",
        })
    }

    /// Reorder torrents in the queue.
    async fn queue_move(&self, ids: &TorrentIds, direction: QueueMove) -> ProviderResult<()> {
        let _ = (ids, direction);
        Err(ProviderError::Unsupported { operation: "queue" })
    }

    /// Connected peers of the torrents.
    async fn peers_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<Peer>> {
        let _ = ids;
        Err(ProviderError::Unsupported {
            operation: "peers get",
        })
    }

    /// Files of the torrents.
    async fn files_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<TorrentFile>> {
        let _ = ids;
        Err(ProviderError::Unsupported {
            operation: "files get",
        })
    }

    /// Change file priority or wanted flags.
    async fn files_set(&self, ids: &TorrentIds, changes: &FileChanges) -> ProviderResult<()> {
        let _ = (ids, changes);
        Err(ProviderError::Unsupported {
            operation: "files set",
        })
    }

    /// Rename a file or directory inside one torrent.
    async fn files_rename(&self, hash: &str, path: &str, name: &str) -> ProviderResult<()> {
        let _ = (hash, path, name);
        Err(ProviderError::Unsupported {
            operation: "files rename",
        })
    }

    /// Trackers of the torrents.
    async fn trackers_get(&self, ids: &TorrentIds) -> ProviderResult<Vec<Tracker>> {
        let _ = ids;
        Err(ProviderError::Unsupported {
            operation: "trackers get",
        })
    }

    /// Add announce URLs to the torrents.
    async fn trackers_add(&self, ids: &TorrentIds, urls: &[String]) -> ProviderResult<()> {
        let _ = (ids, urls);
        Err(ProviderError::Unsupported {
            operation: "trackers add",
        })
    }

    /// Replace the announce URL of one tracker.
    async fn trackers_replace(&self, hash: &str, id: i64, url: &str) -> ProviderResult<()> {
        let _ = (hash, id, url);
        Err(ProviderError::Unsupported {
            operation: "trackers replace",
        })
    }

    /// Remove trackers from one torrent.
    async fn trackers_remove(&self, hash: &str, ids: &[i64]) -> ProviderResult<()> {
        let _ = (hash, ids);
        Err(ProviderError::Unsupported {
            operation: "trackers remove",
        })
    }

    /// Daemon-wide transfer statistics.
    async fn stats(&self) -> ProviderResult<SessionStats> {
        Err(ProviderError::Unsupported { operation: "stats" })
    }

    /// Ask the daemon to exit.
    async fn shutdown(&self) -> ProviderResult<()> {
        Err(ProviderError::Unsupported {
            operation: "shutdown",
        })
    }

    /// Free space at a directory on the daemon host.
    async fn free_space(&self, path: &str) -> ProviderResult<FreeSpace> {
        let _ = path;
        Err(ProviderError::Unsupported {
            operation: "free-space",
        })
    }

    /// Refresh the peer blocklist; returns the rule count.
    async fn blocklist_update(&self) -> ProviderResult<i64> {
        Err(ProviderError::Unsupported {
            operation: "blocklist-update",
        })
    }

    /// Check whether the incoming peer port is reachable.
    async fn port_test(&self) -> ProviderResult<bool> {
        Err(ProviderError::Unsupported {
            operation: "port-test",
        })
    }

    /// Read-modify-write access to the daemon's live configuration.
    async fn remote_config(&self) -> ProviderResult<Box<dyn ConfigStore>> {
        Err(ProviderError::Unsupported {
            operation: "remote config",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Minimal;

    #[async_trait]
    impl Provider for Minimal {
        fn name(&self) -> &'static str {
            "minimal"
        }

        async fn add(&self, request: AddTorrent) -> ProviderResult<AddedTorrent> {
            let _ = request;
            Ok(AddedTorrent::default())
        }

        async fn get(&self, _ids: &TorrentIds, _fields: &[&str]) -> ProviderResult<Vec<Torrent>> {
            Ok(Vec::new())
        }

        async fn remove(&self, _ids: &TorrentIds, _delete: bool) -> ProviderResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_operations_report_unsupported() {
        let provider = Minimal;
        let err = provider
            .port_test()
            .await
            .expect_err("port-test has no default implementation");
        assert!(matches!(
            err,
            ProviderError::Unsupported {
                operation: "port-test"
            }
        ));
        assert!(provider.stop(&TorrentIds::All).await.is_err());
        assert!(provider.get(&TorrentIds::All, &["id"]).await.is_ok());
    }
}
