//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::capture::{human_readable_size, MonitorInfo};
use crate::domain::recording::format_clock;

/// Presenter for CLI output formatting.
///
/// Status goes to stderr; stdout only ever carries the produced path or
/// the value asked for, so the tool composes in shell pipelines.
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn line(&self, text: String) {
        // Keep messages from being overdrawn by an active spinner
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| eprintln!("{}", text)),
            None => eprintln!("{}", text),
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.line(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.line(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.line(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.line(format!("{} {}", "✗".red(), message));
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Recording status line: clock, optional limit, frames and size
    pub fn format_progress(
        &self,
        elapsed: Duration,
        limit: Option<Duration>,
        frames: u64,
        bytes: u64,
    ) -> String {
        let clock = match limit {
            Some(limit) => format!("{} / {}", format_clock(elapsed), format_clock(limit)),
            None => format_clock(elapsed),
        };
        format!(
            "{} {} | {} frames | {}",
            "REC".red().bold(),
            clock,
            frames,
            human_readable_size(bytes)
        )
    }

    /// Update the spinner with recording progress
    pub fn update_recording_progress(
        &self,
        elapsed: Duration,
        limit: Option<Duration>,
        frames: u64,
        bytes: u64,
    ) {
        self.update_spinner(&self.format_progress(elapsed, limit, frames, bytes));
    }

    /// Print one monitor row to stdout
    pub fn monitor(&self, monitor: &MonitorInfo) {
        let marker = if monitor.primary { "*" } else { " " };
        println!(
            "{}{} {} {}x{}+{}+{}",
            marker,
            monitor.index.to_string().cyan(),
            monitor.name,
            monitor.bounds.width,
            monitor.bounds.height,
            monitor.bounds.x,
            monitor.bounds.y
        );
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_progress_without_limit() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let progress = presenter.format_progress(Duration::from_secs(5), None, 150, 2048);
        assert_eq!(progress, "REC 00:05 | 150 frames | 2.0 KB");
    }

    #[test]
    fn format_progress_with_limit() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let progress = presenter.format_progress(
            Duration::from_secs(65),
            Some(Duration::from_secs(120)),
            0,
            0,
        );
        assert!(progress.contains("01:05 / 02:00"));
        assert!(progress.contains("0 frames"));
    }
}
