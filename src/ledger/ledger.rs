//! Failure ledger.
//!
//! Workers record failed outcomes concurrently. The in-memory list feeds
//! the second pass; final failures also go to the durable [`ErrorLog`].
//! The log file is owned by a writer task, so recording a final failure
//! only queues it and never blocks a worker on file I/O.

use super::log::ErrorLog;
use crate::error::{Error, Result};
use crate::task::{DownloadTask, ErrorRecord, TaskOutcome};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Why a failure is written to the durable log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalMarker {
    /// Failed the only pass of the run.
    FirstPass,
    /// Failed again during the second pass.
    Exhausted,
}

impl FinalMarker {
    fn details(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            FinalMarker::FirstPass => &[],
            FinalMarker::Exhausted => &[("retries", "exhausted")],
        }
    }
}

#[derive(Debug)]
struct LogEntry {
    name: String,
    record: ErrorRecord,
    marker: FinalMarker,
}

#[derive(Debug)]
struct LogWriter {
    tx: mpsc::UnboundedSender<LogEntry>,
    join: JoinHandle<Result<PathBuf>>,
}

async fn write_entries(
    mut log: ErrorLog,
    mut rx: mpsc::UnboundedReceiver<LogEntry>,
) -> Result<PathBuf> {
    while let Some(entry) = rx.recv().await {
        let written = log
            .write_failure(&entry.name, &entry.record, entry.marker.details())
            .await;
        if let Err(e) = written {
            warn!("Could not log failure of {}: {}", entry.name, e);
        }
    }
    debug!("Closing error log with {} entries", log.count());
    log.close().await
}

/// Thread-safe record of failed tasks.
#[derive(Debug)]
pub struct FailureLedger {
    failed: Mutex<Vec<TaskOutcome>>,
    log: Mutex<Option<LogWriter>>,
    log_path: Option<PathBuf>,
    logged: AtomicUsize,
}

impl Default for FailureLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FailureLedger {
    /// A ledger without durable log.
    pub fn new() -> Self {
        Self {
            failed: Mutex::new(Vec::new()),
            log: Mutex::new(None),
            log_path: None,
            logged: AtomicUsize::new(0),
        }
    }

    /// A ledger writing final failures to `log`.
    ///
    /// Spawns the writer task, so it must be called within a tokio runtime.
    pub fn with_log(log: ErrorLog) -> Self {
        let log_path = Some(log.path().to_path_buf());
        let (tx, rx) = mpsc::unbounded_channel();
        let join = tokio::spawn(write_entries(log, rx));
        Self {
            failed: Mutex::new(Vec::new()),
            log: Mutex::new(Some(LogWriter { tx, join })),
            log_path,
            logged: AtomicUsize::new(0),
        }
    }

    /// Open a new error log in `run_directory`.
    pub async fn open(run_directory: &Path, title: &str) -> Result<Self> {
        ErrorLog::create(run_directory, title).await.map(Self::with_log)
    }

    /// Append a failed outcome to the in-memory list. Successes are ignored.
    pub fn record(&self, outcome: &TaskOutcome) {
        if outcome.ok {
            return;
        }
        lock(&self.failed).push(outcome.clone());
    }

    /// Append a failed outcome and queue it for the durable log.
    ///
    /// A log write error is reported by the writer and otherwise ignored.
    pub fn record_final(&self, outcome: &TaskOutcome, marker: FinalMarker) {
        let Some(record) = outcome.error.as_ref() else {
            return;
        };
        self.record(outcome);

        let log = lock(&self.log);
        let Some(writer) = log.as_ref() else {
            return;
        };
        let entry = LogEntry {
            name: outcome.task.name.clone(),
            record: record.clone(),
            marker,
        };
        match writer.tx.send(entry) {
            Ok(()) => {
                self.logged.fetch_add(1, Ordering::SeqCst);
            }
            Err(_) => warn!("Error log writer stopped, {} not logged", outcome.task.name),
        }
    }

    /// The failed tasks recorded so far.
    pub fn snapshot(&self) -> Vec<DownloadTask> {
        lock(&self.failed).iter().map(|o| o.task.clone()).collect()
    }

    /// Return the failed tasks and clear the list.
    pub fn drain(&self) -> Vec<DownloadTask> {
        self.take_outcomes().into_iter().map(|o| o.task).collect()
    }

    /// Return the failed outcomes and clear the list.
    pub fn take_outcomes(&self) -> Vec<TaskOutcome> {
        std::mem::take(&mut *lock(&self.failed))
    }

    /// Number of failures in the in-memory list.
    pub fn len(&self) -> usize {
        lock(&self.failed).len()
    }

    /// Whether the in-memory list is empty.
    pub fn is_empty(&self) -> bool {
        lock(&self.failed).is_empty()
    }

    /// Number of failure blocks handed to the durable log.
    pub fn logged(&self) -> usize {
        self.logged.load(Ordering::SeqCst)
    }

    /// Location of the durable log, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Write every queued block and the summary, then close the durable log.
    pub async fn close(&self) -> Result<Option<PathBuf>> {
        let Some(LogWriter { tx, join }) = lock(&self.log).take() else {
            return Ok(None);
        };
        drop(tx);
        match join.await {
            Ok(closed) => closed.map(Some),
            Err(e) => Err(Error::Internal(format!("error log writer failed: {}", e))),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ErrorRecord;
    use crate::Error;
    use std::convert::TryFrom;
    use std::sync::Arc;

    fn failed(name: &str) -> TaskOutcome {
        let task = DownloadTask::try_from(format!("http://h/{name}").as_str()).unwrap();
        let record = ErrorRecord::from_error(&task, &Error::Internal("x".into()), 1);
        TaskOutcome::failure(task, 1, vec![record])
    }

    fn succeeded(name: &str) -> TaskOutcome {
        let task = DownloadTask::try_from(format!("http://h/{name}").as_str()).unwrap();
        TaskOutcome::success(task, 1, Vec::new())
    }

    #[test]
    fn test_record_ignores_successes() {
        let ledger = FailureLedger::new();
        ledger.record(&succeeded("a"));
        ledger.record(&failed("b"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.snapshot()[0].name, "b");
    }

    #[test]
    fn test_snapshot_keeps_drain_clears() {
        let ledger = FailureLedger::new();
        ledger.record(&failed("a"));
        ledger.record(&failed("b"));
        assert_eq!(ledger.snapshot().len(), 2);
        assert_eq!(ledger.len(), 2);

        let drained = ledger.drain();
        assert_eq!(drained.len(), 2);
        assert!(ledger.is_empty());
        assert!(ledger.drain().is_empty());
    }

    #[test]
    fn test_concurrent_record() {
        let ledger = Arc::new(FailureLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        ledger.record(&failed(&format!("{i}-{j}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.len(), 200);
    }

    #[tokio::test]
    async fn test_record_final_writes_log() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::open(dir.path(), "test").await.unwrap();
        ledger.record_final(&failed("a"), FinalMarker::Exhausted);
        ledger.record_final(&failed("b"), FinalMarker::FirstPass);
        ledger.record_final(&succeeded("c"), FinalMarker::FirstPass);
        assert_eq!(ledger.logged(), 2);
        assert_eq!(ledger.len(), 2);

        let path = ledger.close().await.unwrap().unwrap();
        assert_eq!(Some(path.as_path()), ledger.log_path());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("retries: exhausted").count(), 1);
        assert!(text.contains("Total errors logged: 2"));

        assert!(ledger.close().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_record_final_from_many_workers() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(FailureLedger::open(dir.path(), "test").await.unwrap());
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    for j in 0..10 {
                        ledger.record_final(&failed(&format!("{i}-{j}")), FinalMarker::Exhausted);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.await.unwrap();
        }

        assert_eq!(ledger.logged(), 40);
        let path = ledger.close().await.unwrap().unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.matches("Failed to download").count(), 40);
        assert!(text.contains("Total errors logged: 40"));
    }

    #[tokio::test]
    async fn test_without_log() {
        let ledger = FailureLedger::default();
        ledger.record_final(&failed("a"), FinalMarker::Exhausted);
        assert_eq!(ledger.logged(), 0);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.close().await.unwrap().is_none());
    }
}
