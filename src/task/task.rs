//! Represents a file to be downloaded.
//!
//! # Examples
//!
//! ```rust
//! use trawl::task::DownloadTask;
//! use reqwest::Url;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let url = Url::parse("https://example.com/pluginfile.php/42/notes.pdf?token=abc")?;
//! let task = DownloadTask::new("Algebra/notes.pdf", &url, "downloads/Algebra/notes.pdf");
//! assert_eq!(task.destination.file_name().unwrap(), "notes.pdf");
//! # Ok(())
//! # }
//! ```

use crate::error::Error;

use reqwest::Url;
use std::convert::TryFrom;
use std::path::{Path, PathBuf};

/// Represents a file to be downloaded.
///
/// Tasks are produced once by a task source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    /// Human readable identifier, not necessarily unique in a run.
    pub name: String,
    /// URL of the file to download.
    pub source_url: Url,
    /// Where the body is written. Absolute or relative to the working directory.
    pub destination: PathBuf,
}

impl DownloadTask {
    /// Creates a new [`DownloadTask`].
    pub fn new(name: &str, url: &Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            name: String::from(name),
            source_url: url.clone(),
            destination: destination.into(),
        }
    }

    /// Re-root a relative destination under `directory`.
    ///
    /// Absolute destinations are left untouched.
    pub fn with_directory(self, directory: impl AsRef<Path>) -> Self {
        if self.destination.is_absolute() {
            return self;
        }
        let destination = directory.as_ref().join(&self.destination);
        Self {
            destination,
            ..self
        }
    }
}

impl TryFrom<&Url> for DownloadTask {
    type Error = crate::Error;

    fn try_from(value: &Url) -> Result<Self, Self::Error> {
        value
            .path_segments()
            .ok_or_else(|| {
                Error::InvalidUrl(format!(
                    "the url \"{}\" does not contain a valid path",
                    value
                ))
            })?
            .next_back()
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                form_urlencoded::parse(segment.as_bytes())
                    .map(|(key, val)| [key, val].concat())
                    .collect::<String>()
            })
            .map(|name| DownloadTask {
                source_url: value.clone(),
                destination: PathBuf::from(&name),
                name,
            })
            .ok_or_else(|| {
                Error::InvalidUrl(format!("the url \"{}\" does not contain a filename", value))
            })
    }
}

impl TryFrom<&str> for DownloadTask {
    type Error = crate::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value)
            .map_err(|e| {
                Error::InvalidUrl(format!("the url \"{}\" cannot be parsed: {}", value, e))
            })
            .and_then(|u| DownloadTask::try_from(&u))
    }
}
