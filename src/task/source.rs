//! Task source adapters.
//!
//! Producers (course discovery, manifest readers, ...) push tasks into a
//! bounded channel and drop their sender once they are done. The pipeline
//! needs the final task count before sizing the pool, so the channel is
//! drained to completion first.

use super::task::DownloadTask;
use tokio::sync::mpsc;
use tracing::debug;

/// Create a bounded channel for task producers.
pub fn task_channel(capacity: usize) -> (mpsc::Sender<DownloadTask>, mpsc::Receiver<DownloadTask>) {
    mpsc::channel(capacity.max(1))
}

/// Receive every task until all senders are dropped.
pub async fn collect_tasks(mut rx: mpsc::Receiver<DownloadTask>) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();
    while let Some(task) = rx.recv().await {
        tasks.push(task);
    }
    debug!("Collected {} tasks from source", tasks.len());
    tasks
}
