//! Fetch module: performing a single task with bounded retries.
//!
//! - [`transfer`] - One attempt: GET, create directories, write the body
//! - [`retry`] - The exponential backoff schedule between attempts
//! - [`fetcher`] - [`RetryingFetcher`], which loops attempts until success or exhaustion
//!
//! # Examples
//!
//! ```rust,no_run
//! use trawl::fetch::{HttpTransfer, RetryPolicy, RetryingFetcher};
//! use trawl::http::HttpClientConfig;
//! use trawl::task::DownloadTask;
//! use tokio_util::sync::CancellationToken;
//! use std::convert::TryFrom;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = RetryingFetcher::new(
//!     HttpTransfer::from_config(HttpClientConfig::default())?,
//!     RetryPolicy::default(),
//! );
//! let task = DownloadTask::try_from("https://example.com/file.zip")?;
//! if let Some(outcome) = fetcher.fetch(task, &CancellationToken::new()).await {
//!     println!("ok={} after {} attempt(s)", outcome.ok, outcome.attempts);
//! }
//! # Ok(())
//! # }
//! ```

pub mod fetcher;
pub mod retry;
pub mod transfer;

pub use fetcher::RetryingFetcher;
pub use retry::RetryPolicy;
pub use transfer::{HttpTransfer, Transfer};
