//! Pipeline module containing the orchestration, builder pattern, and configuration.
//!
//! # Overview
//!
//! - `pipeline` - Core [`Pipeline`] struct and the [`RunSummary`] it returns
//! - `builder` - [`PipelineBuilder`] for flexible configuration using the builder pattern
//! - `config` - Configuration structures and the [`Concurrency`] bound
//! - `pool` - The bounded [`WorkerPool`]
//! - `second_pass` - The one-time re-run over failed tasks
//!
//! # Examples
//!
//! ```rust
//! use trawl::pipeline::{Concurrency, PipelineBuilder};
//! use std::path::PathBuf;
//!
//! let pipeline = PipelineBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .concurrency(Concurrency::UNBOUNDED)
//!     .second_pass(false)
//!     .build();
//! assert_eq!(pipeline.concurrency(), Concurrency::Unbounded);
//! ```

pub mod builder;
pub mod config;
pub mod pipeline;
pub mod pool;
pub mod second_pass;

pub use builder::PipelineBuilder;
pub use config::{Concurrency, PipelineConfig};
pub use pipeline::{Pipeline, RunSummary};
pub use pool::{OutcomeSink, PassReport, Recording, WorkerPool};
pub use second_pass::{SecondPass, SecondPassReport};
