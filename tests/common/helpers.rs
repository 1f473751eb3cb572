#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};
use trawl::fetch::Transfer;
use trawl::pipeline::PipelineBuilder;
use trawl::task::DownloadTask;
use trawl::{Error, Result};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Common test constants
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/unreachable.bin";
pub const FAST_BACKOFF: Duration = Duration::from_millis(10);

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Asserts that a file exists with the given content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e));
    assert_eq!(content, expected, "Content mismatch at path: {:?}", path);
}

/// Asserts that no partial file is left next to the destination
pub fn assert_no_part_file(destination: &Path) {
    let mut name = destination.file_name().unwrap().to_os_string();
    name.push(".part");
    let part = destination.with_file_name(name);
    assert!(!part.exists(), "Partial file left at {:?}", part);
}

// === Pipeline Helpers ===

/// A hidden pipeline writing into `dir` with fast retries
pub fn create_test_pipeline_builder(dir: &Path, concurrency: i64) -> PipelineBuilder {
    PipelineBuilder::hidden()
        .directory(dir.to_path_buf())
        .concurrency(concurrency)
        .initial_backoff(FAST_BACKOFF)
}

/// Tasks named `file-<i>.bin` pointing at `base`
pub fn create_test_tasks(base: &str, count: usize) -> Vec<DownloadTask> {
    (0..count)
        .map(|i| {
            let url = format!("{}/file-{}.bin", base, i);
            DownloadTask::try_from(url.as_str()).expect("Failed to create task")
        })
        .collect()
}

// === Mock Server Helpers ===

/// Serve `body` at `/<name>`
pub async fn mount_file(server: &MockServer, name: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Serve `status` `times` times at `/<name>`, before any other mock for it
pub async fn mount_failures(server: &MockServer, name: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(times)
        .with_priority(1)
        .mount(server)
        .await;
}

// === Error Log Helpers ===

/// Reads the error log of a run
pub fn read_log(path: &Option<PathBuf>) -> String {
    let path = path.as_ref().expect("The run should have an error log");
    fs::read_to_string(path).expect("Failed to read the error log")
}

/// Number of failure blocks in an error log
pub fn count_failure_blocks(log: &str) -> usize {
    log.lines()
        .filter(|l| l.starts_with('[') && l.contains("] Failed to download "))
        .count()
}

// === Scripted Transfers ===

/// Transfer that tracks how many attempts run at the same time.
#[derive(Debug, Clone, Default)]
pub struct CountingTransfer {
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub calls: Arc<AtomicUsize>,
    pub delay: Duration,
}

impl CountingTransfer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn max(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transfer for CountingTransfer {
    async fn transfer(&self, _task: &DownloadTask) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Transfer failing the first `failures` attempts of each task named in
/// `flaky`, and every attempt of each task named in `broken`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransfer {
    pub flaky: HashSet<String>,
    pub broken: HashSet<String>,
    pub failures: u32,
    pub attempts: Arc<Mutex<HashMap<String, u32>>>,
    pub started: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedTransfer {
    pub fn broken<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            broken: names.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub fn flaky<'a>(names: impl IntoIterator<Item = &'a str>, failures: u32) -> Self {
        Self {
            flaky: names.into_iter().map(String::from).collect(),
            failures,
            ..Self::default()
        }
    }

    pub fn attempts_of(&self, name: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    pub fn start_times(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

impl Transfer for ScriptedTransfer {
    async fn transfer(&self, task: &DownloadTask) -> Result<()> {
        self.started.lock().unwrap().push(Instant::now());
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(task.name.clone()).or_default();
            *n += 1;
            *n
        };

        if self.broken.contains(&task.name)
            || (self.flaky.contains(&task.name) && attempt <= self.failures)
        {
            return Err(Error::Internal(format!("scripted failure #{}", attempt)));
        }
        Ok(())
    }
}
