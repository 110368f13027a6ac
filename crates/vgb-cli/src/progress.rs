//! Progress reporting for a batch run
//!
//! A single bar over the discovered files, plus the end-of-run summary.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub timed_out: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.completed + self.timed_out + self.errored
    }
}

/// Bar over the files of a batch, drawn on stderr
pub fn create_file_progress(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message("Processing files");
    pb
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Summary text printed once the batch is done
pub fn render_summary(summary: &RunSummary, artifacts: &[&Path]) -> String {
    let mut out = format!("{} Processing complete!", style("✓").green());

    if artifacts.is_empty() {
        out.push_str("\n   No result files were written");
    } else {
        out.push_str(" Results saved to:");
        for path in artifacts {
            out.push_str(&format!("\n   - {}", path.display()));
        }
    }

    out.push_str(&format!(
        "\n   {} completed, {} timed out, {} errored ({} files)",
        style(summary.completed).green(),
        style(summary.timed_out).yellow(),
        style(summary.errored).red(),
        summary.total()
    ));
    out
}
