use crate::collab::AuditLog;
use crate::error::ClipError;
use crate::progress::ProgressReporter;
use crate::retention::RetentionDecision;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of executing one [`RetentionDecision`].
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub deleted: Vec<PathBuf>,
    /// Gone before we got to them; counts as satisfied, not failed.
    pub already_gone: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ClipError)>,
    /// Deleted, but the audit append failed.
    pub audit_failures: Vec<(PathBuf, ClipError)>,
    /// Dry-run only: what would have been removed.
    pub would_delete: Vec<PathBuf>,
    pub bytes_freed: u64,
    pub skipped_locked: usize,
    pub skipped_quota: usize,
    pub cancelled: bool,
}

impl ExecutionReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Removes the files a decision names, one at a time.
///
/// Every per-file failure is recorded and the batch carries on. The cancel
/// token is checked between files; a removal already issued is never
/// interrupted.
pub struct DeletionExecutor<'a> {
    audit: &'a dyn AuditLog,
    cancel: &'a AtomicBool,
    dry_run: bool,
}

impl<'a> DeletionExecutor<'a> {
    pub fn new(audit: &'a dyn AuditLog, cancel: &'a AtomicBool) -> Self {
        Self {
            audit,
            cancel,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn execute(
        &self,
        decision: &RetentionDecision,
        reporter: &dyn ProgressReporter,
    ) -> ExecutionReport {
        let start = Instant::now();
        let total = decision.to_delete.len();
        let mut report = ExecutionReport {
            skipped_locked: decision.skipped_locked,
            skipped_quota: decision.skipped_quota,
            ..ExecutionReport::default()
        };

        reporter.on_delete_start(total);

        for (index, clip) in decision.to_delete.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(
                    "Deletion cancelled after {} of {} files",
                    index, total
                );
                report.cancelled = true;
                break;
            }

            if clip.locked {
                error!(
                    "Refusing to delete locked clip {}",
                    clip.path.display()
                );
                report.skipped_locked += 1;
                continue;
            }

            if self.dry_run {
                info!("[dry run] would delete {}", clip.path.display());
                report.would_delete.push(clip.path.clone());
            } else {
                match fs::remove_file(&clip.path) {
                    Ok(()) => {
                        debug!("Deleted {}", clip.path.display());
                        report.bytes_freed += clip.size_bytes;
                        let filename = clip.path.to_string_lossy();
                        if let Err(e) = self.append_audit(&filename) {
                            warn!("Audit append failed for {}: {}", filename, e);
                            report.audit_failures.push((clip.path.clone(), e));
                        }
                        report.deleted.push(clip.path.clone());
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        debug!("{} already gone", clip.path.display());
                        report.already_gone.push(clip.path.clone());
                    }
                    Err(e) => {
                        error!("Failed to remove '{}': {}", clip.path.display(), e);
                        report
                            .failed
                            .push((clip.path.clone(), ClipError::DeleteFailed(e)));
                    }
                }
            }

            reporter.on_delete_progress(index + 1, total);
        }

        reporter.on_delete_complete(
            report.deleted.len(),
            report.failed.len(),
            start.elapsed().as_secs_f64(),
        );

        info!(
            "Deletion batch executed: {} deleted, {} already gone, {} failed",
            report.deleted.len(),
            report.already_gone.len(),
            report.failed.len()
        );
        report
    }

    fn append_audit(&self, filename: &str) -> Result<(), ClipError> {
        let already = self
            .audit
            .has_deletion_record(filename)
            .map_err(|e| ClipError::AuditFailed(e.to_string()))?;
        if already {
            debug!("Audit already holds {}, not appending", filename);
            return Ok(());
        }
        self.audit
            .record_deletion(filename)
            .map_err(|e| ClipError::AuditFailed(e.to_string()))
    }
}
