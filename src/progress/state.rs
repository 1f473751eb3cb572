//! Progress state and its text rendering.
//!
//! [`ProgressState`] is owned by the aggregator task. Everything else only
//! ever sees clones of it, so a snapshot can be read without any locking.

use crate::task::TaskOutcome;

use std::collections::VecDeque;
use std::fmt;

/// Which pass of the run is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pass {
    /// The initial pass over every task.
    #[default]
    First,
    /// The single re-run over the tasks that failed the first pass.
    Second,
}

impl Pass {
    /// Headline shown above the bar while the pass runs.
    pub fn headline(&self) -> &'static str {
        match self {
            Pass::First => "Downloading files...",
            Pass::Second => "Retrying failed files...",
        }
    }
}

/// Cumulative counters for the run.
///
/// `completed_tasks` and `total_tasks` cover the whole run: the second pass
/// never moves them back, it only advances its own `retry_*` counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pass: Pass,
    total_tasks: usize,
    completed_tasks: usize,
    failed_tasks: usize,
    retry_total: usize,
    retry_completed: usize,
    current_task_name: String,
    recent_errors: VecDeque<String>,
    errors_seen: usize,
    error_capacity: usize,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ERROR_CAPACITY)
    }
}

impl ProgressState {
    /// Number of error lines kept by default.
    pub const DEFAULT_ERROR_CAPACITY: usize = 100;

    /// Create an empty state keeping at most `error_capacity` error lines.
    pub fn new(error_capacity: usize) -> Self {
        Self {
            pass: Pass::First,
            total_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            retry_total: 0,
            retry_completed: 0,
            current_task_name: String::new(),
            recent_errors: VecDeque::new(),
            errors_seen: 0,
            error_capacity: error_capacity.max(1),
        }
    }

    /// The pass currently reported.
    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Tasks in the run.
    pub fn total_tasks(&self) -> usize {
        self.total_tasks
    }

    /// Tasks that produced a first-pass outcome.
    pub fn completed_tasks(&self) -> usize {
        self.completed_tasks
    }

    /// Tasks whose latest outcome is a failure.
    pub fn failed_tasks(&self) -> usize {
        self.failed_tasks
    }

    /// Tasks handed to the second pass.
    pub fn retry_total(&self) -> usize {
        self.retry_total
    }

    /// Second-pass tasks that produced an outcome.
    pub fn retry_completed(&self) -> usize {
        self.retry_completed
    }

    /// `(completed, total)` of the pass currently reported, as drawn by the bar.
    pub fn pass_progress(&self) -> (usize, usize) {
        match self.pass {
            Pass::First => (self.completed_tasks, self.total_tasks),
            Pass::Second => (self.retry_completed, self.retry_total),
        }
    }

    /// Name of the task that reported last.
    pub fn current_task_name(&self) -> &str {
        &self.current_task_name
    }

    /// Most recent error lines, oldest first.
    pub fn recent_errors(&self) -> &VecDeque<String> {
        &self.recent_errors
    }

    /// Number of error lines ever appended, including evicted ones.
    pub fn errors_seen(&self) -> usize {
        self.errors_seen
    }

    /// Whether every task of the current pass reported.
    pub fn is_complete(&self) -> bool {
        let (completed, total) = self.pass_progress();
        self.completed_tasks >= self.total_tasks && completed >= total
    }

    pub(crate) fn start_pass(&mut self, pass: Pass, total: usize) {
        self.pass = pass;
        match pass {
            Pass::First => {
                self.total_tasks = total;
                self.completed_tasks = 0;
                self.failed_tasks = 0;
                self.retry_total = 0;
                self.retry_completed = 0;
            }
            Pass::Second => {
                self.retry_total = total;
                self.retry_completed = 0;
            }
        }
        self.current_task_name.clear();
    }

    pub(crate) fn apply(&mut self, outcome: &TaskOutcome) {
        match self.pass {
            Pass::First => {
                if self.completed_tasks < self.total_tasks {
                    self.completed_tasks += 1;
                }
                if !outcome.ok {
                    self.failed_tasks += 1;
                }
            }
            Pass::Second => {
                if self.retry_completed < self.retry_total {
                    self.retry_completed += 1;
                }
                if outcome.ok {
                    self.failed_tasks = self.failed_tasks.saturating_sub(1);
                }
            }
        }
        self.current_task_name.clone_from(&outcome.task.name);

        if let Some(line) = outcome.error_line() {
            self.errors_seen += 1;
            if self.recent_errors.len() == self.error_capacity {
                self.recent_errors.pop_front();
            }
            self.recent_errors.push_back(line);
        }
    }
}

/// Render a `width` cells wide bar followed by the percentage.
///
/// An empty pass renders as complete.
pub fn render_bar(completed: usize, total: usize, width: usize) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        (completed.min(total) as f64) / (total as f64)
    };
    let filled = ((ratio * width as f64) as usize).min(width);
    format!(
        "{}{} {:.1}%",
        "█".repeat(filled),
        " ".repeat(width - filled),
        ratio * 100.0
    )
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (completed, total) = self.pass_progress();
        writeln!(f, "{}", self.pass.headline())?;
        writeln!(f, "{}", render_bar(completed, total, 30))?;
        writeln!(f, "Completed: {}/{}", self.completed_tasks, self.total_tasks)?;
        if self.pass == Pass::Second {
            writeln!(f, "Retried: {}/{}", self.retry_completed, self.retry_total)?;
        }
        if !self.current_task_name.is_empty() {
            writeln!(f, "Current file: {}", self.current_task_name)?;
        }
        if !self.recent_errors.is_empty() {
            writeln!(f, "Errors:")?;
            for line in &self.recent_errors {
                writeln!(f, "- {}", line)?;
            }
        }
        Ok(())
    }
}
