//! Durable error log.
//!
//! One plain text file per run, opened with a banner, one block per final
//! failure, and closed with a summary block:
//!
//! ```text
//! =======================================================
//! trawl Error Log
//! Started: 2026-10-17 12:00:00
//! =======================================================
//!
//! [2026-10-17 12:00:05] [NETWORK] Failed to download report.pdf
//! Error: HTTP request failed: ...
//! Details:
//!   attempt: 4
//!   destination: downloads/report.pdf
//!   file: report.pdf
//!   retries: exhausted
//!   url: https://example.com/report.pdf
//! -------------------------------------------------------
//!
//!
//! =======================================================
//! Summary
//! Total errors logged: 1
//! Completed: 2026-10-17 12:00:20
//! =======================================================
//! ```
//!
//! The log is write only: nothing in the crate reads it back. A log never
//! replaces an existing file: a run starting within the same second as an
//! earlier one gets a `_1`, `_2`, ... suffix.

use crate::error::{Error, Result};
use crate::task::ErrorRecord;

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Directory created inside the run directory to hold the logs.
pub const LOG_DIRECTORY: &str = "error_logs";
/// Title printed in the banner by default.
pub const DEFAULT_TITLE: &str = "trawl Error Log";

const HEAVY_RULE: &str = "=======================================================";
const LIGHT_RULE: &str = "-------------------------------------------------------";
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// An open error log.
#[derive(Debug)]
pub struct ErrorLog {
    file: File,
    path: PathBuf,
    count: usize,
}

impl ErrorLog {
    /// Create `<run_directory>/error_logs/download_errors_<timestamp>.log` and
    /// write the banner.
    pub async fn create(run_directory: &Path, title: &str) -> Result<Self> {
        let started = Local::now();
        let directory = run_directory.join(LOG_DIRECTORY);
        fs::create_dir_all(&directory)
            .await
            .map_err(|source| Error::CreateDirectory {
                path: directory.clone(),
                source,
            })?;

        let (file, path) = create_new(&directory, &started).await?;
        debug!("Created error log {:?}", &path);

        let mut log = Self {
            file,
            path,
            count: 0,
        };
        log.write(&header(title, &started)).await?;
        Ok(log)
    }

    /// Append one failure block. `extra` entries join the record's context.
    pub async fn write_failure(
        &mut self,
        name: &str,
        record: &ErrorRecord,
        extra: &[(&str, &str)],
    ) -> Result<()> {
        self.write(&failure_block(name, record, extra)).await?;
        self.count += 1;
        Ok(())
    }

    /// Number of failure blocks written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the summary block and close the file.
    pub async fn close(mut self) -> Result<PathBuf> {
        let block = summary(self.count, &Local::now());
        self.write(&block).await?;
        self.file.sync_all().await.map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.path)
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        let written = match self.file.write_all(text.as_bytes()).await {
            Ok(()) => self.file.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })
    }
}

async fn create_new(directory: &Path, started: &DateTime<Local>) -> Result<(File, PathBuf)> {
    let mut sequence = 0;
    loop {
        let path = directory.join(file_name(started, sequence));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => sequence += 1,
            Err(source) => return Err(Error::CreateFile { path, source }),
        }
    }
}

/// Name of the log file for a run started at `started`. A non-zero
/// `sequence` is appended to tell apart runs started in the same second.
pub fn file_name(started: &DateTime<Local>, sequence: usize) -> String {
    let stamp = started.format(FILE_STAMP_FORMAT);
    match sequence {
        0 => format!("download_errors_{}.log", stamp),
        n => format!("download_errors_{}_{}.log", stamp, n),
    }
}

/// Banner written when the log is opened.
pub fn header(title: &str, started: &DateTime<Local>) -> String {
    format!(
        "{HEAVY_RULE}\n{title}\nStarted: {}\n{HEAVY_RULE}\n\n",
        started.format(STAMP_FORMAT)
    )
}

/// One failure block.
pub fn failure_block(name: &str, record: &ErrorRecord, extra: &[(&str, &str)]) -> String {
    let mut details = record.context.clone();
    for (key, value) in extra {
        details.insert((*key).to_string(), (*value).to_string());
    }

    let mut block = format!(
        "[{}] [{}] Failed to download {}\nError: {}\n",
        record.timestamp.format(STAMP_FORMAT),
        record.kind.tag(),
        name,
        record.message
    );
    if !details.is_empty() {
        block.push_str("Details:\n");
        for (key, value) in &details {
            block.push_str(&format!("  {key}: {value}\n"));
        }
    }
    block.push_str(LIGHT_RULE);
    block.push_str("\n\n");
    block
}

/// Summary written when the log is closed.
pub fn summary(count: usize, completed: &DateTime<Local>) -> String {
    format!(
        "\n{HEAVY_RULE}\nSummary\nTotal errors logged: {count}\nCompleted: {}\n{HEAVY_RULE}\n",
        completed.format(STAMP_FORMAT)
    )
}
