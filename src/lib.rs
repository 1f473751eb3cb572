//! Trawl downloads batches of files over HTTP(S) with a bounded number of
//! transfers in flight, retries with exponential backoff, a live progress
//! display, and a durable log of every failure.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use trawl::{pipeline::PipelineBuilder, task::DownloadTask, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let reqwest_rs = "https://github.com/seanmonstar/reqwest/archive/refs/tags/v0.11.9.zip";
//! let tasks = vec![DownloadTask::try_from(reqwest_rs)?];
//! let summary = PipelineBuilder::new()
//!     .directory(PathBuf::from("output"))
//!     .concurrency(4)
//!     .build()
//!     .run(tasks)
//!     .await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`task`] - The `DownloadTask` unit of work and its `TaskOutcome`
//! - [`fetch`] - One task with bounded retries: `RetryingFetcher`
//! - [`pipeline`] - The worker pool, second pass and the `Pipeline` tying everything together
//! - [`progress`] - Progress aggregation and display
//! - [`ledger`] - The failure ledger and the durable error log
//! - [`http`] - HTTP client construction
//! - [`error`] - Centralized error handling with the `Error` enum

pub mod error;
pub mod fetch;
pub mod http;
pub mod ledger;
pub mod pipeline;
pub mod progress;
pub mod task;

pub use error::{Error, ErrorKind, Result};
pub use fetch::{HttpTransfer, RetryPolicy, RetryingFetcher, Transfer};
pub use http::{create_http_client, HttpClientConfig};
pub use ledger::{ErrorLog, FailureLedger, FinalMarker};
pub use pipeline::{Concurrency, Pipeline, PipelineBuilder, RunSummary};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use task::{DownloadTask, ErrorRecord, TaskOutcome};
