//! Progress aggregator.
//!
//! The aggregator is a single task owning the [`ProgressState`]. Workers
//! never touch the state: they send [`ProgressEvent`]s through a
//! [`ProgressHandle`], and the aggregator publishes a fresh snapshot on a
//! `watch` channel after each event.
//!
//! # Examples
//!
//! ```rust
//! use trawl::progress::{Pass, ProgressAggregator};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (handle, task) = ProgressAggregator::spawn(10);
//! handle.start_pass(Pass::First, 3);
//! let state = task.finish().await;
//! assert_eq!(state.total_tasks(), 3);
//! # }
//! ```

use super::state::{Pass, ProgressState};
use crate::task::TaskOutcome;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Messages understood by the aggregator.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A pass over `total` tasks begins.
    PassStarted { pass: Pass, total: usize },
    /// A task finished its retry sequence.
    Outcome(TaskOutcome),
    /// Stop after everything queued so far was applied.
    Close,
}

/// Sending side of the aggregator, cheap to clone.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    state: watch::Receiver<ProgressState>,
}

impl ProgressHandle {
    /// Announce a new pass.
    pub fn start_pass(&self, pass: Pass, total: usize) {
        self.send(ProgressEvent::PassStarted { pass, total });
    }

    /// Forward the outcome of a task.
    pub fn report(&self, outcome: TaskOutcome) {
        self.send(ProgressEvent::Outcome(outcome));
    }

    fn send(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            debug!("Progress aggregator already closed, dropping event");
        }
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> ProgressState {
        self.state.borrow().clone()
    }
}

/// Entry point for starting the aggregator.
pub struct ProgressAggregator;

impl ProgressAggregator {
    /// Spawn the aggregator on the current runtime.
    pub fn spawn(error_capacity: usize) -> (ProgressHandle, AggregatorTask) {
        let initial = ProgressState::new(error_capacity);
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let join = tokio::spawn(run(rx, state_tx, initial));

        let handle = ProgressHandle {
            tx: tx.clone(),
            state: state_rx.clone(),
        };
        let task = AggregatorTask {
            tx,
            state: state_rx,
            join,
        };
        (handle, task)
    }
}

/// Owner side of a running aggregator.
pub struct AggregatorTask {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    state: watch::Receiver<ProgressState>,
    join: JoinHandle<ProgressState>,
}

impl AggregatorTask {
    /// Apply every event sent so far, stop the aggregator and return the final state.
    pub async fn finish(self) -> ProgressState {
        let _ = self.tx.send(ProgressEvent::Close);
        match self.join.await {
            Ok(state) => state,
            Err(e) => {
                warn!("Progress aggregator stopped abnormally: {}", e);
                self.state.borrow().clone()
            }
        }
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
    state_tx: watch::Sender<ProgressState>,
    mut state: ProgressState,
) -> ProgressState {
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::PassStarted { pass, total } => state.start_pass(pass, total),
            ProgressEvent::Outcome(outcome) => state.apply(&outcome),
            ProgressEvent::Close => break,
        }
        state_tx.send_replace(state.clone());
    }
    state
}
