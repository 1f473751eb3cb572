//! Failure ledger and durable error log.
//!
//! - `ledger` - [`FailureLedger`], the thread-safe list of failed tasks
//! - `log` - [`ErrorLog`], the per-run text file
//!
//! # Examples
//!
//! ```rust
//! use trawl::ledger::FailureLedger;
//!
//! let ledger = FailureLedger::new();
//! assert!(ledger.is_empty());
//! assert!(ledger.drain().is_empty());
//! ```

pub mod ledger;
pub mod log;

pub use ledger::{FailureLedger, FinalMarker};
pub use log::{ErrorLog, DEFAULT_TITLE, LOG_DIRECTORY};
