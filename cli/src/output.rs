//! Terminal output utilities for styled CLI output.

use console::{Term, style};
use examscan_business::{FileStatus, UploadStep};
use std::fmt::Display;

/// Terminal output helper for consistent styled output.
pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper writing to stdout.
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Print a success message with a green checkmark.
    pub fn success(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✓").green().bold(), message)),
        );
    }

    /// Print an error message with a red X.
    pub fn error(&self, message: impl Display) {
        drop(
            Term::stderr().write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    /// Print a warning message with a yellow warning sign.
    pub fn warning(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("⚠").yellow().bold(), message)),
        );
    }

    /// Print a plain message without any prefix.
    pub fn print(&self, message: impl Display) {
        drop(self.term.write_line(&message.to_string()));
    }

    /// Print a header with emphasis.
    pub fn header(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&style(message).bold().cyan().to_string()),
        );
    }

    /// Print a dim/muted message.
    pub fn dim(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).dim().to_string()));
    }

    /// Print a labeled value with indentation.
    pub fn labeled_indent(&self, label: impl Display, value: impl Display, indent: usize) {
        let spaces = " ".repeat(indent);
        drop(
            self.term
                .write_line(&format!("{spaces}{}: {}", style(label).dim(), value)),
        );
    }

    /// Print one selected file before it is sent.
    pub fn file_item(&self, name: impl Display, mime_type: impl Display, size: impl Display) {
        drop(self.term.write_line(&format!(
            "  {} {} ({}) - {}",
            style("📄").bold(),
            style(name).white().bold(),
            style(mime_type).dim(),
            style(size).cyan()
        )));
    }

    /// Print a pipeline milestone as a `[ 33%]`-style line.
    pub fn progress(&self, step: UploadStep, progress: u8) {
        let label = match step {
            UploadStep::Input => "Waiting",
            UploadStep::Uploading => match progress {
                0 => "Requesting upload URLs",
                1..=33 => "Uploading files",
                _ => "Registering files",
            },
            UploadStep::Success => "Done",
            UploadStep::Error => return,
        };
        drop(self.term.write_line(&format!(
            "{} {}",
            style(format!("[{progress:>3}%]")).cyan().bold(),
            label
        )));
    }

    /// Print a count summary.
    pub fn count(&self, label: impl Display, count: usize) {
        drop(self.term.write_line(&format!(
            "{}: {} file(s)",
            style(label).dim(),
            style(count).cyan().bold()
        )));
    }
}

/// Colored status word for tables.
pub fn styled_status(status: FileStatus) -> String {
    let word = style(status.as_str());
    let styled = match status {
        FileStatus::Completed => word.green(),
        FileStatus::Failed => word.red(),
        FileStatus::Processing => word.yellow(),
        FileStatus::Pending | FileStatus::Unknown => word.dim(),
    };
    styled.to_string()
}
