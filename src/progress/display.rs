//! Live progress display.
//!
//! The display is a single render loop subscribed to the aggregator's
//! snapshots. It owns the indicatif bars; nothing else calls into it.
//!
//! ```rust,no_run
//! use trawl::progress::{ProgressAggregator, ProgressDisplay, StyleOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let (handle, aggregator) = ProgressAggregator::spawn(100);
//! let stop = CancellationToken::new();
//! let render = ProgressDisplay::new(StyleOptions::default()).spawn(handle.subscribe(), stop.clone());
//!
//! // ... report outcomes through `handle` ...
//!
//! let _state = aggregator.finish().await;
//! stop.cancel();
//! let _ = render.await;
//! # }
//! ```

use super::state::ProgressState;
use super::style::StyleOptions;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Renders [`ProgressState`] snapshots.
pub struct ProgressDisplay {
    multi: MultiProgress,
    main: ProgressBar,
    style_options: StyleOptions,
    printed_errors: usize,
}

impl ProgressDisplay {
    /// Create a new display. Nothing is drawn until the first snapshot.
    pub fn new(style_options: StyleOptions) -> Self {
        let multi = match style_options.is_enabled() {
            true => MultiProgress::new(),
            false => MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        };
        let main = multi.add(style_options.main().clone().to_progress_bar(0));

        Self {
            multi,
            main,
            style_options,
            printed_errors: 0,
        }
    }

    /// Draw one snapshot.
    pub fn render(&mut self, state: &ProgressState) {
        let (completed, total) = state.pass_progress();
        self.main.set_length(total as u64);
        self.main.set_position(completed as u64);
        self.main.set_prefix(state.pass().headline());
        self.main.set_message(state.current_task_name().to_string());

        let fresh = state.errors_seen().saturating_sub(self.printed_errors);
        if fresh > 0 && self.style_options.show_errors() {
            let recent = state.recent_errors();
            for line in recent.iter().skip(recent.len().saturating_sub(fresh)) {
                if let Err(e) = self.multi.println(format!("✗ {}", line)) {
                    debug!("Could not print error line: {}", e);
                }
            }
        }
        self.printed_errors = state.errors_seen();
    }

    /// Number of error lines already handled.
    pub fn printed_errors(&self) -> usize {
        self.printed_errors
    }

    /// Run the render loop until `stop` fires or the aggregator goes away.
    pub fn spawn(
        mut self,
        mut snapshots: watch::Receiver<ProgressState>,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = snapshots.borrow_and_update().clone();
                        self.render(&state);
                    }
                }
            }
            let state = snapshots.borrow().clone();
            self.render(&state);
            self.finish();
        })
    }

    /// Finish the bar, clearing or keeping it based on configuration.
    pub fn finish(self) {
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}
