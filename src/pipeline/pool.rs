//! Bounded worker pool.
//!
//! The pool drives one [`RetryingFetcher`] future per task through
//! `buffer_unordered`, so at most `limit` of them are ever polled at the
//! same time. Each outcome goes to an [`OutcomeSink`] as soon as it
//! completes.

use super::config::Concurrency;
use crate::fetch::{RetryingFetcher, Transfer};
use crate::ledger::{FailureLedger, FinalMarker};
use crate::progress::{Pass, ProgressHandle};
use crate::task::{DownloadTask, TaskOutcome};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How failed outcomes are written to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recording {
    /// In memory only, a second pass decides later.
    Deferred,
    /// In memory and in the durable log.
    Final(FinalMarker),
}

/// Where the pool delivers outcomes.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeSink<'a> {
    ledger: &'a FailureLedger,
    progress: &'a ProgressHandle,
    pass: Pass,
    recording: Recording,
}

impl<'a> OutcomeSink<'a> {
    /// Create a new sink.
    pub fn new(
        ledger: &'a FailureLedger,
        progress: &'a ProgressHandle,
        pass: Pass,
        recording: Recording,
    ) -> Self {
        Self {
            ledger,
            progress,
            pass,
            recording,
        }
    }

    /// The pass this sink reports for.
    pub fn pass(&self) -> Pass {
        self.pass
    }

    fn start(&self, total: usize) {
        self.progress.start_pass(self.pass, total);
    }

    /// Hand one outcome to the ledger, then to the progress aggregator.
    pub fn deliver(&self, outcome: TaskOutcome) {
        if !outcome.ok {
            match self.recording {
                Recording::Deferred => self.ledger.record(&outcome),
                Recording::Final(marker) => self.ledger.record_final(&outcome, marker),
            }
        }
        self.progress.report(outcome);
    }
}

/// Tally of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Tasks handed to the pool.
    pub total: usize,
    /// Tasks whose retry sequence succeeded.
    pub succeeded: usize,
    /// Tasks whose retries were exhausted.
    pub failed: usize,
    /// Tasks that produced no outcome because the run was cancelled.
    pub not_run: usize,
}

impl PassReport {
    /// Whether every task produced an outcome.
    pub fn is_complete(&self) -> bool {
        self.succeeded + self.failed == self.total
    }
}

/// Runs fetches with a cap on how many are in flight.
#[derive(Debug, Clone)]
pub struct WorkerPool<T> {
    fetcher: RetryingFetcher<T>,
    concurrency: Concurrency,
}

impl<T: Transfer> WorkerPool<T> {
    /// Create a new pool.
    pub fn new(fetcher: RetryingFetcher<T>, concurrency: Concurrency) -> Self {
        Self {
            fetcher,
            concurrency,
        }
    }

    /// The configured concurrency.
    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// The fetcher used for each task.
    pub fn fetcher(&self) -> &RetryingFetcher<T> {
        &self.fetcher
    }

    /// Run every task once through the fetcher.
    ///
    /// Returns after every started task reported. Once `cancel` fires no new
    /// task is started and in-flight ones are aborted without an outcome.
    pub async fn run(
        &self,
        tasks: Vec<DownloadTask>,
        sink: &OutcomeSink<'_>,
        cancel: &CancellationToken,
    ) -> PassReport {
        if tasks.is_empty() {
            debug!("No tasks for the {:?} pass", sink.pass());
            return PassReport::default();
        }

        let total = tasks.len();
        let limit = self.concurrency.limit(total);
        debug!("Starting {:?} pass over {} tasks, {} at a time", sink.pass(), total, limit);
        sink.start(total);

        let mut report = PassReport {
            total,
            ..PassReport::default()
        };
        let outcomes = stream::iter(tasks)
            .take_until(cancel.cancelled())
            .map(|task| self.fetcher.fetch(task, cancel))
            .buffer_unordered(limit);
        futures::pin_mut!(outcomes);

        while let Some(outcome) = outcomes.next().await {
            let Some(outcome) = outcome else {
                continue;
            };
            if outcome.ok {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            sink.deliver(outcome);
        }

        report.not_run = total - report.succeeded - report.failed;
        report
    }
}
