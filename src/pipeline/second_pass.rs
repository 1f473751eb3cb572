//! Second pass over the failures of the first one.

use super::pool::{OutcomeSink, Recording, WorkerPool};
use crate::fetch::Transfer;
use crate::ledger::{FailureLedger, FinalMarker};
use crate::progress::{Pass, ProgressHandle};

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Tally of the second pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondPassReport {
    /// Tasks re-run.
    pub retried: usize,
    /// Tasks that succeeded this time.
    pub recovered: usize,
    /// Tasks that failed again and were logged as exhausted.
    pub exhausted: usize,
    /// Tasks left without outcome because the run was cancelled.
    pub not_run: usize,
}

/// Runs the pool once more over the tasks in the ledger.
pub struct SecondPass;

impl SecondPass {
    /// Drain the ledger and re-run its tasks with the same pool.
    ///
    /// Returns `None` when nothing failed. Failures of this pass are written
    /// to the durable log as exhausted.
    pub async fn run<T: Transfer>(
        pool: &WorkerPool<T>,
        ledger: &FailureLedger,
        progress: &ProgressHandle,
        cancel: &CancellationToken,
    ) -> Option<SecondPassReport> {
        let tasks = ledger.drain();
        if tasks.is_empty() {
            return None;
        }

        info!("Retrying {} failed files", tasks.len());
        let sink = OutcomeSink::new(
            ledger,
            progress,
            Pass::Second,
            Recording::Final(FinalMarker::Exhausted),
        );
        let report = pool.run(tasks, &sink, cancel).await;
        info!(
            "Second pass done: {} recovered, {} failed after retries",
            report.succeeded, report.failed
        );

        Some(SecondPassReport {
            retried: report.total,
            recovered: report.succeeded,
            exhausted: report.failed,
            not_run: report.not_run,
        })
    }
}
