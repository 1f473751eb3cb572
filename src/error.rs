//! Error handling for the trawl library.
//!
//! This module provides the [`Error`] enum returned by every fallible
//! operation, and the coarse [`ErrorKind`] taxonomy used when a failure is
//! reported to the progress display and written to the error log.

use reqwest::StatusCode;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when using trawl.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// This variant captures internal errors that don't fit into other categories.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O Error.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    ///
    /// This variant wraps HTTP client errors from the reqwest library, including
    /// network failures and errors raised while streaming the response body.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error raised by the HTTP middleware stack.
    #[error("HTTP middleware error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The server answered with a non-success status.
    #[error("server returned {status} for {url}")]
    Status { url: String, status: StatusCode },

    /// The ancestor directories of a destination could not be created.
    #[error("error creating the directory {}: {source}", path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    /// The destination file could not be created or truncated.
    #[error("error creating the file {}: {source}", path.display())]
    CreateFile { path: PathBuf, source: io::Error },

    /// Writing the body to disk failed.
    #[error("error copying the file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl Error {
    /// Classify the error for reporting purposes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Reqwest { .. } | Error::Status { .. } => ErrorKind::Network,
            Error::Middleware { source } => match source {
                reqwest_middleware::Error::Reqwest(_) => ErrorKind::Network,
                reqwest_middleware::Error::Middleware(_) => ErrorKind::Unclassified,
            },
            Error::IOError { .. }
            | Error::CreateDirectory { .. }
            | Error::CreateFile { .. }
            | Error::Write { .. } => ErrorKind::FileSystem,
            Error::Internal(_) | Error::InvalidUrl(_) => ErrorKind::Unclassified,
        }
    }
}

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request or transport failure, or a non-success response.
    Network,
    /// Directory creation, file creation, or write failure.
    FileSystem,
    /// Anything else. Kept so that no information is lost.
    Unclassified,
}

impl ErrorKind {
    /// Tag written into the error log.
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::FileSystem => "FILE_SYSTEM",
            ErrorKind::Unclassified => "UNCLASSIFIED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result type alias for operations that can fail with a trawl error.
pub type Result<T> = std::result::Result<T, Error>;
