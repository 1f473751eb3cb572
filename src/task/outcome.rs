//! Task outcome tracking.
//!
//! A [`TaskOutcome`] is produced exactly once per task and per pass, after
//! the retry sequence for that task is over. Every failed attempt leaves an
//! [`ErrorRecord`] behind in the outcome's history.
//!
//! # Examples
//!
//! ```rust
//! use trawl::task::{DownloadTask, ErrorRecord, TaskOutcome};
//! use trawl::Error;
//! use std::convert::TryFrom;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let task = DownloadTask::try_from("https://example.com/file.zip")?;
//! let record = ErrorRecord::from_error(&task, &Error::Internal("boom".into()), 1);
//! let outcome = TaskOutcome::failure(task, 1, vec![record]);
//! assert!(!outcome.ok);
//! assert_eq!(outcome.error.unwrap().message, "Internal error: boom");
//! # Ok(())
//! # }
//! ```

use super::task::DownloadTask;
use crate::error::{Error, ErrorKind};

use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Immutable description of one failure.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Failure category.
    pub kind: ErrorKind,
    /// Rendered error message.
    pub message: String,
    /// Key/value context written into the error log.
    pub context: BTreeMap<String, String>,
    /// When the failure happened.
    pub timestamp: DateTime<Local>,
}

impl ErrorRecord {
    /// Build a record for the failed `attempt` (1-indexed) of `task`.
    pub fn from_error(task: &DownloadTask, error: &Error, attempt: u32) -> Self {
        let mut context = BTreeMap::new();
        context.insert("file".to_string(), task.name.clone());
        context.insert("url".to_string(), task.source_url.to_string());
        context.insert(
            "destination".to_string(),
            task.destination.display().to_string(),
        );
        context.insert("attempt".to_string(), attempt.to_string());

        Self {
            kind: error.kind(),
            message: error.to_string(),
            context,
            timestamp: Local::now(),
        }
    }
}

/// Result of the whole retry sequence for one task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// The task this outcome belongs to.
    pub task: DownloadTask,
    /// Whether one of the attempts succeeded.
    pub ok: bool,
    /// The final failure, set only when `ok` is false.
    pub error: Option<ErrorRecord>,
    /// Number of attempts performed.
    pub attempts: u32,
    /// Errors of every failed attempt, oldest first.
    pub history: Vec<ErrorRecord>,
}

impl TaskOutcome {
    /// Outcome of a task whose last attempt succeeded.
    pub fn success(task: DownloadTask, attempts: u32, history: Vec<ErrorRecord>) -> Self {
        Self {
            task,
            ok: true,
            error: None,
            attempts,
            history,
        }
    }

    /// Outcome of a task whose attempts were all exhausted.
    pub fn failure(task: DownloadTask, attempts: u32, history: Vec<ErrorRecord>) -> Self {
        let error = history.last().cloned();
        Self {
            task,
            ok: false,
            error,
            attempts,
            history,
        }
    }

    /// One line summary used by the progress display.
    pub fn error_line(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| format!("Error downloading {}: {}", self.task.name, e.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn create_test_task() -> DownloadTask {
        DownloadTask::try_from("http://example.com/test.zip").unwrap()
    }

    #[test]
    fn test_record_context() {
        let task = create_test_task();
        let record = ErrorRecord::from_error(&task, &Error::InvalidUrl("bad".into()), 2);

        assert_eq!(record.kind, ErrorKind::Unclassified);
        assert_eq!(record.context["file"], "test.zip");
        assert_eq!(record.context["url"], "http://example.com/test.zip");
        assert_eq!(record.context["destination"], "test.zip");
        assert_eq!(record.context["attempt"], "2");
    }

    #[test]
    fn test_success_has_no_error() {
        let task = create_test_task();
        let record = ErrorRecord::from_error(&task, &Error::Internal("x".into()), 1);
        let outcome = TaskOutcome::success(task, 2, vec![record]);

        assert!(outcome.ok);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.history.len(), 1);
        assert!(outcome.error_line().is_none());
    }

    #[test]
    fn test_failure_keeps_last_error() {
        let task = create_test_task();
        let first = ErrorRecord::from_error(&task, &Error::Internal("first".into()), 1);
        let last = ErrorRecord::from_error(&task, &Error::Internal("last".into()), 2);
        let outcome = TaskOutcome::failure(task, 2, vec![first, last]);

        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_ref().unwrap().message, "Internal error: last");
        assert_eq!(
            outcome.error_line().unwrap(),
            "Error downloading test.zip: Internal error: last"
        );
    }
}
