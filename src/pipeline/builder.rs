//! Builder pattern implementation for creating Pipeline instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust
//! use trawl::pipeline::PipelineBuilder;
//! use std::path::PathBuf;
//!
//! let pipeline = PipelineBuilder::new()
//!     .directory(PathBuf::from("./downloads"))
//!     .concurrency(5)
//!     .retries(3)
//!     .build();
//! assert_eq!(pipeline.retries(), 3);
//! ```
//!
//! ## Hidden Progress Bars
//!
//! ```rust
//! use trawl::pipeline::PipelineBuilder;
//!
//! // No bar and no quit key watcher, as in tests.
//! let pipeline = PipelineBuilder::hidden().build();
//! ```

use super::config::{Concurrency, PipelineConfig};
use super::pipeline::Pipeline;
use crate::progress::StyleOptions;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::path::PathBuf;
use std::time::Duration;

/// A builder used to create a [`Pipeline`].
///
/// ```rust
/// # fn main()  {
/// use trawl::pipeline::PipelineBuilder;
///
/// let p = PipelineBuilder::new().retries(5).directory("downloads".into()).build();
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        PipelineBuilder::default()
    }

    /// Convenience function to hide the progress bar and skip the quit key watcher.
    pub fn hidden() -> Self {
        let mut builder = PipelineBuilder::default();
        builder.config.style_options = StyleOptions::hidden();
        builder.config.watch_keys = false;
        builder
    }

    /// Sets the run directory.
    ///
    /// Relative destinations and the `error_logs` directory are placed in it.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.run_directory = directory;
        self
    }

    /// Set the maximum number of tasks in flight.
    ///
    /// Zero or a negative value, like [`Concurrency::UNBOUNDED`], runs one
    /// worker per task.
    pub fn concurrency(mut self, concurrency: impl Into<i64>) -> Self {
        self.config.concurrency = Concurrency::from(concurrency.into());
        self
    }

    /// Set the number of retries per task.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.config.initial_backoff = initial_backoff;
        self
    }

    /// Enable or disable the second pass over failed tasks.
    pub fn second_pass(mut self, second_pass: bool) -> Self {
        self.config.second_pass = second_pass;
        self
    }

    /// Set the display style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Set how many error lines the progress state keeps.
    pub fn error_capacity(mut self, error_capacity: usize) -> Self {
        self.config.error_capacity = error_capacity;
        self
    }

    /// Enable or disable quitting with the `q` key.
    pub fn watch_keys(mut self, watch_keys: bool) -> Self {
        self.config.watch_keys = watch_keys;
        self
    }

    /// Set the title written in the error log banner.
    pub fn log_title(mut self, title: impl Into<String>) -> Self {
        self.config.log_title = title.into();
        self
    }

    /// Route every request through `proxy`.
    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be merged into a single one.
    ///
    /// # Example
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue, HeaderMap};
    /// use trawl::pipeline::PipelineBuilder;
    ///
    /// let ua = HeaderValue::from_str("curl/7.87").expect("Invalid UA");
    ///
    /// let pipeline = PipelineBuilder::new()
    ///     .headers(HeaderMap::from_iter([(header::USER_AGENT, ua)]))
    ///     .build();
    /// ```
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: PipelineBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add the http header.
    ///
    /// # Example
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use trawl::pipeline::PipelineBuilder;
    ///
    /// let token = HeaderValue::from_str("Bearer abc").expect("Invalid token");
    ///
    /// let pipeline = PipelineBuilder::new()
    ///     .header(header::AUTHORIZATION, token)
    ///     .build();
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Pipeline`] with the specified options.
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.config)
    }
}
