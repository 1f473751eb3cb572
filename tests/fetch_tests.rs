//! Tests for the fetch module functionality.
//!
//! - Retry schedule and attempt bound of the RetryingFetcher
//! - HttpTransfer against a mock server
//! - Cancellation

use trawl::fetch::{HttpTransfer, RetryPolicy, RetryingFetcher};
use trawl::http::HttpClientConfig;
use trawl::task::DownloadTask;
use trawl::ErrorKind;

use reqwest::Url;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

mod common;
use common::helpers::*;

fn http_fetcher(retries: u32) -> RetryingFetcher<HttpTransfer> {
    let transfer = HttpTransfer::from_config(HttpClientConfig::default()).unwrap();
    RetryingFetcher::new(transfer, RetryPolicy::new(retries, FAST_BACKOFF))
}

fn task_for(server: &MockServer, name: &str, destination: impl Into<std::path::PathBuf>) -> DownloadTask {
    let url = Url::parse(&format!("{}/{}", server.uri(), name)).unwrap();
    DownloadTask::new(name, &url, destination)
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_between_attempts() {
    let transfer = ScriptedTransfer::broken(["always.bin"]);
    let fetcher = RetryingFetcher::new(transfer.clone(), RetryPolicy::default());
    let task = DownloadTask::try_from("http://example.com/always.bin").unwrap();

    let outcome = fetcher.fetch(task, &CancellationToken::new()).await.unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.history.len(), 4);
    assert_eq!(transfer.attempts_of("always.bin"), 4);

    let starts = transfer.start_times();
    let expected = [1000, 2000, 4000];
    for (gap, expected_ms) in starts.windows(2).map(|w| w[1] - w[0]).zip(expected) {
        assert!(
            gap >= Duration::from_millis(expected_ms) && gap < Duration::from_millis(expected_ms + 20),
            "gap {:?} should be about {}ms",
            gap,
            expected_ms
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_fails_twice_then_succeeds() {
    let transfer = ScriptedTransfer::flaky(["flaky.bin"], 2);
    let fetcher = RetryingFetcher::new(transfer.clone(), RetryPolicy::default());
    let task = DownloadTask::try_from("http://example.com/flaky.bin").unwrap();

    let outcome = fetcher.fetch(task, &CancellationToken::new()).await.unwrap();

    assert!(outcome.ok);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.history.len(), 2);
}

#[tokio::test]
async fn test_zero_retries_single_attempt() {
    let transfer = ScriptedTransfer::broken(["once.bin"]);
    let fetcher = RetryingFetcher::new(transfer.clone(), RetryPolicy::new(0, FAST_BACKOFF));
    let task = DownloadTask::try_from("http://example.com/once.bin").unwrap();

    let outcome = fetcher.fetch(task, &CancellationToken::new()).await.unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(transfer.attempts_of("once.bin"), 1);
}

#[tokio::test]
async fn test_cancelled_fetch_has_no_outcome() {
    let transfer = ScriptedTransfer::broken(["never.bin"]);
    let fetcher = RetryingFetcher::new(transfer.clone(), RetryPolicy::default());
    let task = DownloadTask::try_from("http://example.com/never.bin").unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(fetcher.fetch(task, &cancel).await.is_none());
    assert_eq!(transfer.attempts_of("never.bin"), 0);
}

#[tokio::test]
async fn test_http_download_creates_directories() {
    let server = MockServer::start().await;
    let body = create_test_content(4096);
    mount_file(&server, "report.pdf", body.clone()).await;

    let dir = create_temp_dir();
    let destination = dir.path().join("course/week 1/report.pdf");
    let task = task_for(&server, "report.pdf", &destination);

    let outcome = http_fetcher(0)
        .fetch(task, &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.ok);
    assert_file_content(&destination, &body);
    assert_no_part_file(&destination);
}

#[tokio::test]
async fn test_http_download_overwrites() {
    let server = MockServer::start().await;
    let body = create_test_content(512);
    mount_file(&server, "same.bin", body.clone()).await;

    let dir = create_temp_dir();
    let destination = dir.path().join("same.bin");
    std::fs::write(&destination, b"stale content that is longer than nothing").unwrap();

    let fetcher = http_fetcher(0);
    for _ in 0..2 {
        let task = task_for(&server, "same.bin", &destination);
        let outcome = fetcher.fetch(task, &CancellationToken::new()).await.unwrap();
        assert!(outcome.ok);
        assert_file_content(&destination, &body);
    }
}

#[tokio::test]
async fn test_http_flaky_server_recovers() {
    let server = MockServer::start().await;
    let body = b"finally".to_vec();
    mount_failures(&server, "flaky.bin", 500, 2).await;
    mount_file(&server, "flaky.bin", body.clone()).await;

    let dir = create_temp_dir();
    let destination = dir.path().join("flaky.bin");
    let task = task_for(&server, "flaky.bin", &destination);

    let outcome = http_fetcher(3)
        .fetch(task, &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.ok);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.history.len(), 2);
    assert!(outcome.history.iter().all(|r| r.kind == ErrorKind::Network));
    assert_file_content(&destination, &body);
}

#[tokio::test]
async fn test_http_status_failure_leaves_no_file() {
    let server = MockServer::start().await;
    mount_failures(&server, "missing.bin", 404, 10).await;

    let dir = create_temp_dir();
    let destination = dir.path().join("missing.bin");
    let task = task_for(&server, "missing.bin", &destination);

    let outcome = http_fetcher(1)
        .fetch(task, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 2);
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Network);
    assert!(error.message.contains("404"));
    assert_eq!(error.context["attempt"], "2");
    assert!(!destination.exists());
    assert_no_part_file(&destination);
}

#[tokio::test]
async fn test_http_unwritable_destination_is_filesystem_error() {
    let server = MockServer::start().await;
    mount_file(&server, "blocked.bin", b"data".to_vec()).await;

    let dir = create_temp_dir();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let task = task_for(&server, "blocked.bin", blocker.join("blocked.bin"));

    let outcome = http_fetcher(0)
        .fetch(task, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.error.unwrap().kind, ErrorKind::FileSystem);
}

#[tokio::test]
async fn test_http_unreachable_host() {
    let dir = create_temp_dir();
    let url = Url::parse(UNREACHABLE_URL).unwrap();
    let task = DownloadTask::new("unreachable.bin", &url, dir.path().join("unreachable.bin"));

    let outcome = http_fetcher(1)
        .fetch(task, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.ok);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.error.unwrap().kind, ErrorKind::Network);
}
