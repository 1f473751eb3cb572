//! Core pipeline implementation.
//!
//! This module contains the [`Pipeline`] struct that wires the worker pool,
//! the progress aggregator and display, the failure ledger and the second
//! pass together, and the [`RunSummary`] it returns.
//!
//! # Examples
//!
//! ## Basic Run
//!
//! ```rust,no_run
//! use trawl::pipeline::PipelineBuilder;
//! use trawl::task::DownloadTask;
//! use std::convert::TryFrom;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PipelineBuilder::new().build();
//! let tasks = vec![
//!     DownloadTask::try_from("https://example.com/file1.zip")?,
//!     DownloadTask::try_from("https://example.com/file2.pdf")?,
//! ];
//!
//! let summary = pipeline.run(tasks).await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming Source
//!
//! ```rust,no_run
//! use trawl::pipeline::PipelineBuilder;
//! use trawl::task::{task_channel, DownloadTask};
//! use std::convert::TryFrom;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, rx) = task_channel(16);
//! tokio::spawn(async move {
//!     if let Ok(task) = DownloadTask::try_from("https://example.com/file1.zip") {
//!         let _ = tx.send(task).await;
//!     }
//! });
//!
//! let summary = PipelineBuilder::new().build().run_from(rx).await?;
//! # Ok(())
//! # }
//! ```

use super::config::{Concurrency, PipelineConfig};
use super::pool::{OutcomeSink, PassReport, Recording, WorkerPool};
use super::second_pass::{SecondPass, SecondPassReport};
use crate::error::Result;
use crate::fetch::{HttpTransfer, RetryPolicy, RetryingFetcher, Transfer};
use crate::http::HttpClientConfig;
use crate::ledger::{FailureLedger, FinalMarker};
use crate::progress::{watch_for_quit, Pass, ProgressAggregator, ProgressDisplay, ProgressState};
use crate::task::{collect_tasks, DownloadTask};

use reqwest::header::HeaderMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Tasks received.
    pub total: usize,
    /// Tally of the first pass.
    pub first_pass: PassReport,
    /// Tally of the second pass, if one ran.
    pub second_pass: Option<SecondPassReport>,
    /// Failure blocks written to the error log.
    pub errors_logged: usize,
    /// The error log, if one was opened.
    pub log_path: Option<PathBuf>,
    /// Whether the run was cancelled.
    pub interrupted: bool,
    /// Final progress state.
    pub progress: ProgressState,
}

impl RunSummary {
    /// Summary of a run that received no task.
    pub fn nothing_to_do() -> Self {
        Self::default()
    }

    /// Whether the run received no task.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Tasks that ended up downloaded.
    pub fn succeeded(&self) -> usize {
        self.first_pass.succeeded + self.second_pass.map_or(0, |s| s.recovered)
    }

    /// Whether every task was downloaded.
    pub fn success(&self) -> bool {
        !self.interrupted && self.succeeded() == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No files to download.");
        }
        if self.interrupted {
            writeln!(f, "Interrupted.")?;
        }
        write!(f, "Downloaded {}/{} files.", self.succeeded(), self.total)?;
        if let Some(second) = self.second_pass {
            write!(
                f,
                "\nRetried {} files: {} recovered on retry, {} failed after retries exhausted.",
                second.retried, second.recovered, second.exhausted
            )?;
        }
        if self.errors_logged > 0 {
            write!(f, "\nTotal errors: {}", self.errors_logged)?;
            if let Some(path) = &self.log_path {
                write!(f, "\nError log: {}", path.display())?;
            }
        }
        Ok(())
    }
}

/// Represents the download pipeline.
///
/// A pipeline can be created via its builder:
///
/// ```rust
/// # fn main()  {
/// use trawl::pipeline::PipelineBuilder;
///
/// let p = PipelineBuilder::new().build();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl Pipeline {
    /// Creates a new Pipeline with the given configuration.
    pub(crate) fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Gets the run directory.
    pub fn directory(&self) -> &PathBuf {
        &self.config.run_directory
    }

    /// Gets the concurrency bound.
    pub fn concurrency(&self) -> Concurrency {
        self.config.concurrency
    }

    /// Gets the number of retries per task.
    pub fn retries(&self) -> u32 {
        self.config.retries
    }

    /// Gets whether the second pass is enabled.
    pub fn second_pass(&self) -> bool {
        self.config.second_pass
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Token cancelling the run in progress, or the next one if none is.
    ///
    /// Tripping it aborts the work in flight. Once the cancelled run has
    /// returned, later runs get a fresh token, so fetch it again for them.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn renew_cancellation_token(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if cancel.is_cancelled() {
            *cancel = CancellationToken::new();
        }
    }

    /// Collect the tasks sent through `rx` until every sender is dropped, then run them.
    pub async fn run_from(&self, rx: mpsc::Receiver<DownloadTask>) -> Result<RunSummary> {
        let tasks = collect_tasks(rx).await;
        self.run(tasks).await
    }

    /// Download every task over HTTP.
    pub async fn run(&self, tasks: Vec<DownloadTask>) -> Result<RunSummary> {
        if tasks.is_empty() {
            info!("No files to download");
            return Ok(RunSummary::nothing_to_do());
        }

        let transfer = HttpTransfer::from_config(HttpClientConfig {
            proxy: self.config.proxy.clone(),
            headers: self.config.headers.clone(),
        })?;
        self.run_with(transfer, tasks).await
    }

    /// Run every task through `transfer`.
    pub async fn run_with<T: Transfer>(
        &self,
        transfer: T,
        tasks: Vec<DownloadTask>,
    ) -> Result<RunSummary> {
        if tasks.is_empty() {
            info!("No files to download");
            return Ok(RunSummary::nothing_to_do());
        }

        let run_directory = &self.config.run_directory;
        let tasks: Vec<DownloadTask> = tasks
            .into_iter()
            .map(|t| t.with_directory(run_directory))
            .collect();
        let total = tasks.len();

        let ledger = FailureLedger::open(run_directory, &self.config.log_title).await?;
        debug!("Error log at {:?}", ledger.log_path());

        let cancel = self.cancellation_token();
        let (progress, aggregator) = ProgressAggregator::spawn(self.config.error_capacity);
        let stop_display = cancel.child_token();
        let display = ProgressDisplay::new(self.config.style_options.clone())
            .spawn(progress.subscribe(), stop_display.clone());
        let quit = match self.config.watch_keys {
            true => watch_for_quit(cancel.clone()),
            false => None,
        };
        if quit.is_some() {
            info!("Press q to quit");
        }

        let policy = RetryPolicy::new(self.config.retries, self.config.initial_backoff);
        let pool = WorkerPool::new(RetryingFetcher::new(transfer, policy), self.config.concurrency);

        let recording = match self.config.second_pass {
            true => Recording::Deferred,
            false => Recording::Final(FinalMarker::FirstPass),
        };
        let sink = OutcomeSink::new(&ledger, &progress, Pass::First, recording);
        let first_pass = pool.run(tasks, &sink, &cancel).await;
        debug!(?first_pass, "First pass done");

        let second_pass = match (self.config.second_pass, cancel.is_cancelled()) {
            (true, false) => SecondPass::run(&pool, &ledger, &progress, &cancel).await,
            (true, true) => {
                for outcome in ledger.take_outcomes() {
                    ledger.record_final(&outcome, FinalMarker::FirstPass);
                }
                None
            }
            (false, _) => None,
        };

        drop(quit);
        let interrupted = cancel.is_cancelled();
        if interrupted {
            warn!("Run interrupted");
            self.renew_cancellation_token();
        }

        drop(progress);
        let progress = aggregator.finish().await;
        stop_display.cancel();
        if let Err(e) = display.await {
            debug!("Progress display stopped abnormally: {}", e);
        }

        let errors_logged = ledger.logged();
        let log_path = ledger.close().await?;

        Ok(RunSummary {
            total,
            first_pass,
            second_pass,
            errors_logged,
            log_path,
            interrupted,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total: usize, succeeded: usize) -> RunSummary {
        RunSummary {
            total,
            first_pass: PassReport {
                total,
                succeeded,
                failed: total - succeeded,
                not_run: 0,
            },
            ..RunSummary::default()
        }
    }

    #[test]
    fn test_nothing_to_do() {
        let s = RunSummary::nothing_to_do();
        assert!(s.is_empty());
        assert!(s.success());
        assert_eq!(s.to_string(), "No files to download.");
    }

    #[test]
    fn test_success_counts_recovered() {
        let mut s = summary(5, 4);
        assert!(!s.success());
        s.second_pass = Some(SecondPassReport {
            retried: 1,
            recovered: 1,
            exhausted: 0,
            not_run: 0,
        });
        assert!(s.success());
        assert!(s.to_string().contains("1 recovered on retry"));
    }

    #[test]
    fn test_display_reports_log() {
        let mut s = summary(2, 1);
        s.errors_logged = 1;
        s.log_path = Some(PathBuf::from("error_logs/x.log"));
        let text = s.to_string();
        assert!(text.starts_with("Downloaded 1/2 files."));
        assert!(text.contains("Total errors: 1"));
        assert!(text.contains("Error log: error_logs/x.log"));
    }

    #[test]
    fn test_interrupted_is_not_success() {
        let mut s = summary(1, 1);
        s.interrupted = true;
        assert!(!s.success());
    }
}
