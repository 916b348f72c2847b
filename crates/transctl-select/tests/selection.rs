use std::sync::Mutex;

use async_trait::async_trait;
use transctl_core::{AddTorrent, AddedTorrent, Provider, ProviderResult, Torrent, TorrentIds};
use transctl_select::{SelectError, Selector};

struct Fixture {
    torrents: Vec<Torrent>,
    requested: Mutex<Vec<Vec<String>>>,
}

impl Fixture {
    fn new() -> Self {
        let torrent = |id: i64, hash: &str, name: &str| Torrent {
            id: Some(id),
            hash_string: Some(hash.to_string()),
            name: Some(name.to_string()),
            ..Torrent::default()
        };
        Self {
            torrents: vec![
                torrent(1, &format!("aaaa12{}", "f".repeat(34)), "debian.iso"),
                torrent(2, &"b".repeat(40), "ubuntu.iso"),
            ],
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for Fixture {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn add(&self, _request: AddTorrent) -> ProviderResult<AddedTorrent> {
        Ok(AddedTorrent::default())
    }

    async fn get(&self, _ids: &TorrentIds, fields: &[&str]) -> ProviderResult<Vec<Torrent>> {
        self.requested
            .lock()
            .expect("lock")
            .push(fields.iter().map(ToString::to_string).collect());
        Ok(self.torrents.clone())
    }

    async fn remove(&self, _ids: &TorrentIds, _delete: bool) -> ProviderResult<()> {
        Ok(())
    }
}

async fn names(provider: &Fixture, identifier: &str) -> Result<Vec<String>, SelectError> {
    let torrents = Selector::new()
        .with_identifiers(vec![identifier.to_string()])
        .select(provider)
        .await?;
    Ok(torrents.into_iter().filter_map(|torrent| torrent.name).collect())
}

#[tokio::test]
async fn hash_prefix_needs_five_characters() -> anyhow::Result<()> {
    let provider = Fixture::new();
    assert_eq!(names(&provider, "aaaa12").await?, vec!["debian.iso"]);
    assert_eq!(names(&provider, "aaaa1").await?, vec!["debian.iso"]);
    assert!(names(&provider, "aaa").await?.is_empty());
    assert_eq!(names(&provider, "AAAA1").await?, vec!["debian.iso"]);
    Ok(())
}

#[tokio::test]
async fn identifiers_match_ids_and_name_globs() -> anyhow::Result<()> {
    let provider = Fixture::new();
    assert_eq!(names(&provider, "2").await?, vec!["ubuntu.iso"]);
    assert_eq!(names(&provider, "*.iso").await?, vec!["debian.iso", "ubuntu.iso"]);
    Ok(())
}

#[tokio::test]
async fn filter_fetches_only_referenced_fields() -> anyhow::Result<()> {
    let provider = Fixture::new();
    let torrents = Selector::new()
        .with_filter(Some("name %% 'ub*'".into()))
        .select(&provider)
        .await?;
    assert_eq!(torrents.len(), 1);
    let requested = provider.requested.lock().expect("lock").clone();
    assert_eq!(requested, vec![vec!["hashString".to_string(), "name".to_string()]]);
    Ok(())
}

#[tokio::test]
async fn non_boolean_filter_fails() {
    let provider = Fixture::new();
    let err = Selector::new()
        .with_filter(Some("name".into()))
        .select(&provider)
        .await
        .expect_err("filter is a string");
    assert!(matches!(err, SelectError::Filter { .. }));
}
