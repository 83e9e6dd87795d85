use clipkeep_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Renders pass progress on stderr: a spinner while scanning, a bar while deleting.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICKS),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &str) {
        self.set_bar(spinner(format!("Scanning {}...", root)));
    }

    fn on_scan_complete(&self, clips: usize, rejected: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} clips, {} rejected in {:.2}s",
            clips, rejected, duration_secs
        );
    }

    fn on_plan_complete(&self, candidates: usize, bytes: u64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Plan complete: {} clips to delete ({} bytes)",
            candidates, bytes
        );
    }

    fn on_delete_start(&self, total: usize) {
        if total == 0 {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Deleting [{bar:30.red/dim}] {pos}/{len} clips",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICKS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_delete_progress(&self, processed: usize, _total: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(processed as u64);
            }
        }
    }

    fn on_delete_complete(&self, deleted: usize, failed: usize, duration_secs: f64) {
        self.finish_bar();
        let mark = if failed == 0 {
            "\x1b[32m✓\x1b[0m"
        } else {
            "\x1b[33m!\x1b[0m"
        };
        eprintln!(
            "  {} Deletion complete: {} deleted, {} failed in {:.2}s",
            mark, deleted, failed, duration_secs
        );
    }
}
