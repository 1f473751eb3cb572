//! Task module containing the units of work handled by the pipeline.
//!
//! - [`task`] - The immutable [`DownloadTask`] value
//! - [`outcome`] - Per-task results: [`TaskOutcome`] and [`ErrorRecord`]
//! - [`source`] - Adapters turning a closable channel into a sized batch
//!
//! # Examples
//!
//! ```rust
//! use trawl::task::DownloadTask;
//! use std::convert::TryFrom;
//!
//! let task = DownloadTask::try_from("https://example.com/slides/week%201.pdf")?
//!     .with_directory("courses/algebra");
//! assert_eq!(task.name, "week 1.pdf");
//! # Ok::<(), trawl::Error>(())
//! ```

pub mod outcome;
pub mod source;
pub mod task;

pub use outcome::{ErrorRecord, TaskOutcome};
pub use source::{collect_tasks, task_channel};
pub use task::DownloadTask;
