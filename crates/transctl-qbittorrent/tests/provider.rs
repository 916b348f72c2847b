use httpmock::prelude::*;
use serde_json::json;
use transctl_core::{
    FileChanges, FilePriority, Provider, ProviderError, SessionConfig, Status, TorrentIds,
};
use transctl_qbittorrent::QbitProvider;
use url::Url;

fn provider_for(server: &MockServer) -> QbitProvider {
    let url = Url::parse(&server.url("/")).expect("mock url");
    QbitProvider::connect(&SessionConfig::new(url)).expect("provider builds")
}

#[tokio::test]
async fn get_maps_torrent_info() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let info = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/torrents/info")
            .body("hashes=abc%7Cdef");
        then.status(200).json_body(json!([
            {"hash": "abc", "name": "one", "state": "downloading", "progress": 0.25},
            {"hash": "def", "name": "two", "state": "pausedUP", "progress": 1.0},
        ]));
    });

    let torrents = provider_for(&server)
        .get(&TorrentIds::hashes(["abc", "def"]), &["name", "status"])
        .await?;
    info.assert();
    assert_eq!(torrents.len(), 2);
    assert_eq!(torrents[0].status, Some(Status::Downloading));
    assert_eq!(torrents[1].status, Some(Status::Stopped));
    assert_eq!(torrents[1].hash(), "def");
    Ok(())
}

#[tokio::test]
async fn stop_falls_back_to_pause() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let stop = server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/stop");
        then.status(404);
    });
    let pause = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/torrents/pause")
            .body("hashes=all");
        then.status(200).body("");
    });

    provider_for(&server).stop(&TorrentIds::All).await?;
    stop.assert();
    pause.assert();
    Ok(())
}

#[tokio::test]
async fn unwanting_all_files_lists_them_first() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/files").body("hash=abc");
        then.status(200).json_body(json!([
            {"index": 0, "name": "a", "size": 10, "progress": 0, "priority": 1},
            {"index": 1, "name": "b", "size": 10, "progress": 0, "priority": 6},
        ]));
    });
    let prio = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/torrents/filePrio")
            .body("hash=abc&id=0%7C1&priority=0");
        then.status(200);
    });

    let changes = FileChanges {
        wanted: Some(false),
        ..FileChanges::default()
    };
    provider_for(&server)
        .files_set(&TorrentIds::hashes(["abc"]), &changes)
        .await?;
    prio.assert();
    Ok(())
}

#[tokio::test]
async fn files_report_priority() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/files");
        then.status(200).json_body(json!([
            {"index": 0, "name": "a", "size": 10, "progress": 1, "priority": 6},
        ]));
    });

    let files = provider_for(&server)
        .files_get(&TorrentIds::hashes(["abc"]))
        .await?;
    assert_eq!(files[0].priority, FilePriority::High);
    assert_eq!(files[0].hash_string, "abc");
    Ok(())
}

#[tokio::test]
async fn tracker_replace_resolves_url_by_id() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/torrents/trackers");
        then.status(200).json_body(json!([
            {"url": "** [DHT] **", "status": 2, "tier": ""},
            {"url": "http://old/announce", "status": 2, "tier": 0},
        ]));
    });
    let edit = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/torrents/editTracker")
            .body("hash=abc&origUrl=http%3A%2F%2Fold%2Fannounce&newUrl=http%3A%2F%2Fnew%2Fannounce");
        then.status(200);
    });

    let provider = provider_for(&server);
    provider
        .trackers_replace("abc", 0, "http://new/announce")
        .await?;
    edit.assert();

    let err = provider
        .trackers_replace("abc", 5, "http://new/announce")
        .await
        .expect_err("unknown tracker id");
    assert!(matches!(err, ProviderError::TrackerNotFound { id: 5 }));
    Ok(())
}

#[tokio::test]
async fn remote_config_submits_only_changed_preferences() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let get = server.mock(|when, then| {
        when.method(POST).path("/api/v2/app/preferences");
        then.status(200)
            .json_body(json!({"max_ratio": 1.5, "save_path": "/data", "listen_port": 8999}));
    });
    let set = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/app/setPreferences")
            .body("json=%7B%22max_ratio%22%3A2%7D");
        then.status(200);
    });

    let provider = provider_for(&server);
    let mut store = provider.remote_config().await?;
    assert_eq!(store.get("max_ratio").await?.as_deref(), Some("1.5"));
    store.set("max_ratio", "2").await?;
    store.write().await?;
    get.assert();
    set.assert();
    Ok(())
}

#[tokio::test]
async fn free_space_reads_server_state() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/v2/sync/maindata");
        then.status(200)
            .json_body(json!({"rid": 1, "server_state": {"free_space_on_disk": 1_500_000_000_i64}}));
    });

    let space = provider_for(&server).free_space("/downloads").await?;
    assert_eq!(space.path, "/downloads");
    assert_eq!(space.size_bytes.0, 1_500_000_000);
    Ok(())
}

#[tokio::test]
async fn blocklist_is_unsupported() {
    let server = MockServer::start_async().await;
    let err = provider_for(&server)
        .blocklist_update()
        .await
        .expect_err("no blocklist endpoint");
    assert!(matches!(err, ProviderError::Unsupported { .. }));
}
