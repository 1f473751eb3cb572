//! Progress module containing the aggregator and the live display.
//!
//! The module is organized into:
//!
//! - `state` - [`ProgressState`] and the pure [`render_bar`] function
//! - `aggregator` - The single task owning the state
//! - `display` - The indicatif render loop
//! - `style` - Progress bar styling options
//! - `keys` - The quit key watcher
//!
//! # Examples
//!
//! ```rust
//! use trawl::progress::render_bar;
//!
//! assert_eq!(render_bar(1, 2, 4), "██   50.0%");
//! ```

pub(crate) mod aggregator;
pub(crate) mod display;
pub(crate) mod keys;
pub(crate) mod state;
pub(crate) mod style;

pub use aggregator::{AggregatorTask, ProgressAggregator, ProgressEvent, ProgressHandle};
pub use display::ProgressDisplay;
pub use keys::{is_quit, watch_for_quit, QuitGuard, QuitSwitch};
pub use state::{render_bar, Pass, ProgressState};
pub use style::{ProgressBarOpts, StyleOptions};
