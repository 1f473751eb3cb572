//! HTTP module containing HTTP client functionality.
//!
//! The client is a `reqwest` client wrapped with tracing middleware. It does
//! not retry on its own: retries are performed per task by
//! [`RetryingFetcher`](crate::fetch::RetryingFetcher), so that filesystem
//! failures and network failures follow the same policy.
//!
//! # Examples
//!
//! ```rust
//! use trawl::http::{create_http_client, HttpClientConfig};
//! use reqwest::header::{HeaderMap, USER_AGENT};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut headers = HeaderMap::new();
//! headers.insert(USER_AGENT, "MyApp/1.0".parse()?);
//!
//! let config = HttpClientConfig {
//!     proxy: None,
//!     headers: Some(headers),
//! };
//!
//! let client = create_http_client(config)?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{create_http_client, HttpClientConfig};
