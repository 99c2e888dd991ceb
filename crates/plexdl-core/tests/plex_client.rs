//! Integration test: Plex client against a local server emulating the Plex API.

mod common;

use std::sync::Arc;

use common::plex_server::{
    self, FOREIGN_BODY, FOREIGN_REDIRECT_PART, LOCAL_REDIRECT_PART, MACHINE_ID, SERVER_TOKEN,
    TRACK_A_BODY,
};
use plexdl_core::coordinator::{AutoConfirm, BatchCoordinator, DownloadOutcome, RunRequest};
use plexdl_core::error::LibraryError;
use plexdl_core::library::plex::{PlexClient, PlexOptions};
use plexdl_core::library::{AssetDescriptor, AssetLocator, AttrValue, LibraryClient};
use plexdl_core::run_log::RunLog;
use tempfile::tempdir;

fn options(base: &str) -> PlexOptions {
    PlexOptions {
        client_identifier: "plexdl-tests".to_string(),
        plex_tv_url: base.to_string(),
    }
}

#[test]
fn connect_reads_server_identity() {
    let base = plex_server::start();
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();
    assert_eq!(client.machine_identifier(), MACHINE_ID);
    assert_eq!(client.server_name(), Some("Test Server"));
}

#[test]
fn bad_token_is_auth_error() {
    let base = plex_server::start();
    let err = PlexClient::connect_with_options(&base, "wrong", options(&base)).unwrap_err();
    assert!(matches!(err, LibraryError::Auth(_)), "got {err:?}");
}

#[test]
fn unreachable_host_is_connection_error() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = PlexClient::connect(&format!("http://127.0.0.1:{port}"), SERVER_TOKEN).unwrap_err();
    assert!(matches!(err, LibraryError::Connection(_)), "got {err:?}");
}

#[test]
fn lists_and_loads_playlists() {
    let base = plex_server::start();
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();

    let lists = client.collections().unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].title, "Road Trip");
    assert_eq!(lists[0].item_count, 2);

    let collection = client.collection("Road Trip").unwrap();
    assert_eq!(collection.items.len(), 2);
    let a = &collection.items[0];
    assert_eq!((a.title.as_str(), a.container.as_str()), ("Song A", "mp3"));
    assert_eq!(a.attribute("addedAt"), Some(AttrValue::Int(1700000200)));
    assert_eq!(
        a.locator.as_ref().unwrap().file_name.as_deref(),
        Some("01 Song A.mp3")
    );

    let err = client.collection("Nope").unwrap_err();
    assert!(matches!(err, LibraryError::NotFound(_)));
}

#[test]
fn fetch_asset_writes_into_temp_dir() {
    let base = plex_server::start();
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();
    let collection = client.collection("Road Trip").unwrap();
    let tmp = tempdir().unwrap();

    let path = client.fetch_asset(&collection.items[0], tmp.path()).unwrap();
    assert_eq!(path, tmp.path().join("01 Song A.mp3"));
    assert_eq!(std::fs::read(&path).unwrap(), TRACK_A_BODY);

    let err = client.fetch_asset(&collection.items[1], tmp.path()).unwrap_err();
    assert!(matches!(err, LibraryError::Fetch(ref m) if m.contains("404")), "got {err:?}");
}

fn part(key: &str) -> AssetDescriptor {
    AssetDescriptor::new(0, "Redirected", "mp3").with_locator(AssetLocator {
        key: key.to_string(),
        file_name: Some("redirected.mp3".to_string()),
    })
}

#[test]
fn same_origin_redirect_keeps_token() {
    let base = plex_server::start();
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();
    let tmp = tempdir().unwrap();

    let path = client.fetch_asset(&part(LOCAL_REDIRECT_PART), tmp.path()).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), TRACK_A_BODY);
}

#[test]
fn cross_origin_redirect_drops_token() {
    let (foreign, seen) = plex_server::start_token_recorder();
    let base = plex_server::start_redirecting_to(&foreign);
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();
    let tmp = tempdir().unwrap();

    let path = client.fetch_asset(&part(FOREIGN_REDIRECT_PART), tmp.path()).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), FOREIGN_BODY);
    assert_eq!(*seen.lock().unwrap(), vec![None]);
}

#[test]
fn switch_account_uses_server_access_token() {
    let base = plex_server::start();
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();

    let kids = client.switch_account("kids").unwrap();
    assert_eq!(kids.machine_identifier(), MACHINE_ID);
    assert_eq!(kids.collection("Road Trip").unwrap().items.len(), 2);

    let err = client.switch_account("guest").unwrap_err();
    assert!(matches!(err, LibraryError::NotFound(_)), "got {err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn playlist_run_over_http() {
    let base = plex_server::start();
    let client = PlexClient::connect_with_options(&base, SERVER_TOKEN, options(&base)).unwrap();
    let root = tempdir().unwrap();
    let log = Arc::new(RunLog::open(&root.path().join("plexdl.log")).unwrap());
    let mut coordinator = BatchCoordinator::new(Arc::new(client), Arc::clone(&log));

    let mut req = RunRequest::new("Road Trip");
    req.base_dir = root.path().to_path_buf();
    req.order_by = Some("index".into());
    req.confirmed = true;
    let summary = coordinator.run(&req, &AutoConfirm).await.unwrap().unwrap();

    // Sorted by index: Song B (1) before Song A (2).
    let names: Vec<String> = summary.items.iter().map(|i| i.to_string()).collect();
    assert_eq!(names, ["Song B.flac", "Song A.mp3"]);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let dir = root.path().join("Road Trip");
    assert_eq!(
        summary.outcomes[1],
        DownloadOutcome::Success { path: dir.join("Song A.mp3") }
    );
    assert_eq!(std::fs::read(dir.join("Song A.mp3")).unwrap(), TRACK_A_BODY);
    assert!(matches!(
        summary.outcomes[0],
        DownloadOutcome::Failure { ref title, .. } if title == "Song B"
    ));
    assert!(log.read_to_string().unwrap().contains("Failed to download Song B"));
}
