//! Progress bar styling and configuration options.
//!
//! # Examples
//!
//! ## Custom Styling
//!
//! ```rust
//! use trawl::progress::{StyleOptions, ProgressBarOpts};
//!
//! let custom_style = StyleOptions::new(
//!     ProgressBarOpts::new(
//!         Some("[{bar:40.cyan/blue}] {pos}/{len} {msg}".to_string()),
//!         Some("█▉▊▋▌▍▎▏  ".to_string()),
//!         true,
//!         false,
//!     ),
//!     true,
//! );
//! assert!(custom_style.is_enabled());
//! ```
//!
//! ## Hidden Progress Bars
//!
//! ```rust
//! use trawl::progress::StyleOptions;
//!
//! assert!(!StyleOptions::hidden().is_enabled());
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Define the display style options.
///
/// By default the bar stays on the screen upon completion and failures are
/// printed above it as they happen.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Style options for the overall progress bar.
    pub(crate) main: ProgressBarOpts,
    /// Print a line for every failure above the bar.
    pub(crate) show_errors: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            main: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_BAR_WITH_FILE.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_ROUGH.into()),
                enabled: true,
                clear: false,
            },
            show_errors: true,
        }
    }
}

impl StyleOptions {
    /// Create new [`StyleOptions`].
    pub fn new(main: ProgressBarOpts, show_errors: bool) -> Self {
        Self { main, show_errors }
    }

    /// Style options with nothing drawn.
    pub fn hidden() -> Self {
        Self {
            main: ProgressBarOpts::hidden(),
            show_errors: false,
        }
    }

    /// Set the options for the progress bar.
    pub fn set_main(&mut self, main: ProgressBarOpts) {
        self.main = main;
    }

    /// Return `false` if the bar is disabled.
    pub fn is_enabled(&self) -> bool {
        self.main.enabled
    }

    /// Get a reference to the progress bar options.
    pub fn main(&self) -> &ProgressBarOpts {
        &self.main
    }

    /// Whether failures are printed above the bar.
    pub fn show_errors(&self) -> bool {
        self.show_errors
    }
}

/// Define the options for a progress bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    /// Progress bar template string.
    template: Option<String>,
    /// Progression characters set.
    ///
    /// There must be at least 3 characters for the following states:
    /// "filled", "current", and "to do".
    progress_chars: Option<String>,
    /// Enable or disable the progress bar.
    pub(crate) enabled: bool,
    /// Clear the progress bar once completed.
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: None,
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }
}

impl ProgressBarOpts {
    /// Headline, bar, position and the file that reported last.
    ///
    /// `Downloading files... ███████████████            12/30 (40%) report.pdf`
    pub const TEMPLATE_BAR_WITH_FILE: &'static str =
        "{prefix:.bold} {bar:30.magenta} {pos:>}/{len} ({percent}%) {wide_msg:.yellow}";
    /// Use rough blocks as progress characters: `"█  "`.
    pub const CHARS_ROUGH: &'static str = "█  ";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(
        template: Option<String>,
        progress_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            progress_chars,
            enabled,
            clear,
        }
    }

    /// Create a [`ProgressStyle`] based on the provided options.
    ///
    /// An invalid template falls back to the default bar.
    pub fn to_progress_style(self) -> ProgressStyle {
        let mut style = ProgressStyle::default_bar();
        if let Some(template) = self.template {
            style = match style.clone().template(&template) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Ignoring invalid progress template {:?}: {}", template, e);
                    style
                }
            };
        }
        if let Some(progress_chars) = self.progress_chars {
            style = style.progress_chars(&progress_chars);
        }
        style
    }

    /// Create a [`ProgressBar`] based on the provided options.
    pub fn to_progress_bar(self, len: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let style = self.to_progress_style();
        ProgressBar::new(len).with_style(style)
    }

    /// Set to `true` to clear the progress bar upon completion.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    /// Create a new [`ProgressBarOpts`] which hides the progress bar.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..ProgressBarOpts::default()
        }
    }
}
