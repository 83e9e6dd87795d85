/// Trait for reporting pass progress.
///
/// The CLI implements it with indicatif; library callers can ignore it.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &str) {}
    fn on_scan_complete(&self, _clips: usize, _rejected: usize, _duration_secs: f64) {}
    fn on_plan_complete(&self, _candidates: usize, _bytes: u64) {}
    fn on_delete_start(&self, _total: usize) {}
    fn on_delete_progress(&self, _processed: usize, _total: usize) {}
    fn on_delete_complete(&self, _deleted: usize, _failed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
