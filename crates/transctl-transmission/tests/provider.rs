use httpmock::prelude::*;
use serde_json::json;
use transctl_core::{
    ByteCount, FilePriority, Provider, ProviderError, SessionConfig, TorrentIds,
};
use transctl_transmission::TransmissionProvider;
use url::Url;

fn provider_for(server: &MockServer) -> TransmissionProvider {
    let url = Url::parse(&server.url("/transmission/rpc/")).expect("mock url");
    TransmissionProvider::connect(&SessionConfig::new(url)).expect("provider builds")
}

#[tokio::test]
async fn files_get_joins_files_and_stats() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/transmission/rpc/").json_body(json!({
            "method": "torrent-get",
            "arguments": {"ids": ["abcdef1234"], "fields": ["hashString", "files", "fileStats"]},
            "tag": 1,
        }));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"torrents": [{
                "hashString": "abcdef1234",
                "files": [
                    {"name": "a/one.bin", "length": 2048, "bytesCompleted": 1024},
                    {"name": "a/two.bin", "length": 0, "bytesCompleted": 0},
                ],
                "fileStats": [
                    {"wanted": true, "priority": 1, "bytesCompleted": 1024},
                    {"wanted": false, "priority": -1, "bytesCompleted": 0},
                ],
            }]},
        }));
    });

    let files = provider_for(&server)
        .files_get(&TorrentIds::hashes(["abcdef1234"]))
        .await?;
    mock.assert();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].hash_string, "abcdef1234");
    assert_eq!(files[0].priority, FilePriority::High);
    assert_eq!(files[1].index, 1);
    assert!(!files[1].wanted);
    assert_eq!(files[1].length, ByteCount(0));
    Ok(())
}

#[tokio::test]
async fn free_space_decodes_size() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/transmission/rpc/");
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"path": "/", "size-bytes": 1_500_000_000_i64},
        }));
    });

    let space = provider_for(&server).free_space("/").await?;
    assert_eq!(space.path, "/");
    assert_eq!(space.size_bytes, ByteCount(1_500_000_000));
    Ok(())
}

#[tokio::test]
async fn add_reports_duplicates() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/transmission/rpc/");
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"torrent-duplicate": {"id": 9, "name": "iso", "hashString": "0123456789"}},
        }));
    });

    let added = provider_for(&server)
        .add(transctl_core::AddTorrent::new(transctl_core::TorrentSource::Url(
            "magnet:?xt=urn:btih:0123456789".into(),
        )))
        .await?;
    assert_eq!(added.to_string(), "duplicate 0123456 iso");
    Ok(())
}

#[tokio::test]
async fn remote_config_flushes_session_set() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let get = server.mock(|when, then| {
        when.method(POST)
            .path("/transmission/rpc/")
            .json_body(json!({"method": "session-get", "arguments": {}, "tag": 1}));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"peer-port": 51413, "download-dir": "/data", "units": {"size-units": ["kB"]}},
        }));
    });
    let set = server.mock(|when, then| {
        when.method(POST).path("/transmission/rpc/").json_body(json!({
            "method": "session-set",
            "arguments": {"peer-port": 6881},
            "tag": 2,
        }));
        then.status(200)
            .json_body(json!({"result": "success", "arguments": {}}));
    });

    let provider = provider_for(&server);
    let mut store = provider.remote_config().await?;
    assert_eq!(store.get("units.size-units").await?.as_deref(), Some("kB"));
    store.set("peer-port", "6881").await?;
    store.write().await?;
    get.assert();
    set.assert();
    Ok(())
}

#[tokio::test]
async fn tracker_replace_requires_success() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/transmission/rpc/");
        then.status(200)
            .json_body(json!({"result": "Invalid tracker id", "arguments": {}}));
    });

    let err = provider_for(&server)
        .trackers_replace("abc", 7, "http://tracker/announce")
        .await
        .expect_err("daemon rejected the request");
    assert!(matches!(err, ProviderError::RequestFailed { .. }));
}
