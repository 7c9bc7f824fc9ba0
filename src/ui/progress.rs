use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::session::{LogEntry, LogKind, RunObserver};
use crate::ui::icons::{ANALYST, CHECK, CROSS, INFO, LINK, SCOUT, UPLOAD};

/// Terminal UI for an analysis run, rendered via `indicatif`.
///
/// Two bars are stacked vertically:
/// - Progress bar: weighted stage completion, 0-100
/// - Status spinner: the most recent status-log line
///
/// Status-log lines are printed above the bars as they arrive.
pub struct AnalysisUi {
    multi: MultiProgress,
    progress_bar: ProgressBar,
    status_bar: ProgressBar,
}

impl AnalysisUi {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stdout())
    }

    /// A UI that draws nothing. Used when stdout is not a terminal.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let progress_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos:>3}%")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let progress_bar = multi.add(ProgressBar::new(100));
        progress_bar.set_style(progress_style);
        progress_bar.set_prefix("Progress");

        let status_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(status_style);
        status_bar.set_prefix("  Status");

        Self {
            multi,
            progress_bar,
            status_bar,
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` when the
    /// bars are hidden (no terminal) or the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        // A hidden draw target accepts `println` and drops the line.
        if self.multi.is_hidden() {
            eprintln!("{}", msg.as_ref());
            return;
        }
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Start the spinner before the upload is sent.
    pub fn start(&self, file_name: &str) {
        self.progress_bar.set_position(0);
        self.status_bar
            .set_message(format!("{}Uploading {}", UPLOAD, style(file_name).cyan()));
        self.status_bar
            .enable_steady_tick(Duration::from_millis(100));
    }

    pub fn percentage(&self) -> u64 {
        self.progress_bar.position()
    }

    /// One status-log line, coloured by its source.
    pub fn format_entry(entry: &LogEntry) -> String {
        let (icon, text) = match entry.kind {
            LogKind::System => (LINK, style(entry.message.as_str()).dim()),
            LogKind::Info => (INFO, style(entry.message.as_str())),
            LogKind::Scout => (SCOUT, style(entry.message.as_str()).magenta()),
            LogKind::Analyst => (ANALYST, style(entry.message.as_str()).blue()),
            LogKind::Error => (CROSS, style(entry.message.as_str()).red().bold()),
        };
        format!("{} {}{}", style(entry.timestamp()).dim(), icon, text)
    }

    /// Stop both bars so no spinner is left running.
    pub fn finish(&self, success: bool) {
        if success {
            self.progress_bar.finish();
            self.status_bar
                .finish_with_message(format!("{}Analysis complete", CHECK));
        } else {
            self.progress_bar.abandon();
            self.status_bar
                .abandon_with_message(format!("{}Analysis failed", CROSS));
        }
    }
}

impl Default for AnalysisUi {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for AnalysisUi {
    fn on_entry(&self, entry: &LogEntry, percentage: u8) {
        self.progress_bar.set_position(u64::from(percentage));
        self.status_bar.set_message(entry.message.clone());
        self.print_line(Self::format_entry(entry));
    }

    fn on_finish(&self, percentage: u8, success: bool) {
        self.progress_bar.set_position(u64::from(percentage));
        self.finish(success);
    }
}
