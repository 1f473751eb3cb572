//! Configuration structures and defaults for the pipeline.
//!
//! # Examples
//!
//! ```rust
//! use trawl::pipeline::Concurrency;
//!
//! assert_eq!(Concurrency::from(3_i64).limit(10), 3);
//! assert_eq!(Concurrency::from(0_i64).limit(10), 10);
//! assert_eq!(Concurrency::from(Concurrency::UNBOUNDED), Concurrency::Unbounded);
//! ```

use crate::ledger::DEFAULT_TITLE;
use crate::progress::{ProgressState, StyleOptions};

use reqwest::header::HeaderMap;
use std::env::current_dir;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on the number of tasks in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// At most this many fetches at once.
    Bounded(NonZeroUsize),
    /// One worker per task, sized when the pass starts.
    Unbounded,
}

impl Concurrency {
    /// Value callers pass to request an unbounded run.
    pub const UNBOUNDED: i64 = -1;

    /// Number of workers for a pass over `tasks` tasks. Never zero.
    pub fn limit(&self, tasks: usize) -> usize {
        match self {
            Concurrency::Bounded(n) => n.get(),
            Concurrency::Unbounded => tasks.max(1),
        }
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Concurrency::Bounded(NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN))
    }
}

impl From<i64> for Concurrency {
    fn from(value: i64) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Concurrency::Unbounded, Concurrency::Bounded)
    }
}

impl From<usize> for Concurrency {
    fn from(value: usize) -> Self {
        NonZeroUsize::new(value).map_or(Concurrency::Unbounded, Concurrency::Bounded)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::Bounded(n) => write!(f, "{}", n),
            Concurrency::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Configuration structure for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base for relative destinations and for the error log directory.
    pub run_directory: PathBuf,
    /// Maximum number of tasks in flight.
    pub concurrency: Concurrency,
    /// Retries after the first attempt of a task.
    pub retries: u32,
    /// Delay before the first retry, doubled for each following one.
    pub initial_backoff: Duration,
    /// Re-run the failed tasks once after the first pass.
    pub second_pass: bool,
    /// Progress display style options.
    pub style_options: StyleOptions,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    /// Optional proxy configuration.
    pub proxy: Option<reqwest::Proxy>,
    /// Number of error lines kept by the progress state.
    pub error_capacity: usize,
    /// Let the user quit with the `q` key.
    pub watch_keys: bool,
    /// Title written in the error log banner.
    pub log_title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            run_directory: current_dir().unwrap_or_default(),
            concurrency: Concurrency::default(),
            retries: 3,
            initial_backoff: Duration::from_secs(1),
            second_pass: true,
            style_options: StyleOptions::default(),
            headers: None,
            proxy: None,
            error_capacity: ProgressState::DEFAULT_ERROR_CAPACITY,
            watch_keys: true,
            log_title: DEFAULT_TITLE.to_string(),
        }
    }
}
