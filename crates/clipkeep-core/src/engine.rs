use crate::collab::{AuditLog, LockSource};
use crate::config::{AppConfig, RetentionMode, RetentionSettings};
use crate::error::{Error, PassWarning};
use crate::executor::{DeletionExecutor, ExecutionReport};
use crate::platform::{DiskProbe, Fs2Probe};
use crate::progress::ProgressReporter;
use crate::retention::{DiskUsage, LockSet, Planner, RetentionDecision};
use crate::scanner::{self, Inventory};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct RetentionEngine {
    config: AppConfig,
    settings: RetentionSettings,
    locks: Arc<dyn LockSource>,
    audit: Arc<dyn AuditLog>,
    disk: Arc<dyn DiskProbe>,
    running: AtomicBool,
    cancel_token: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct PassSummary {
    pub mode: RetentionMode,
    pub started_at: DateTime<Utc>,
    pub scan_duration: Duration,
    pub total_duration: Duration,
    pub clips_scanned: usize,
    pub rejected_entries: usize,
    pub disk_usage: Option<DiskUsage>,
    pub candidates: usize,
    pub capped: usize,
    pub report: ExecutionReport,
    pub warnings: Vec<PassWarning>,
}

impl PassSummary {
    pub fn deleted(&self) -> usize {
        self.report.deleted_count()
    }

    pub fn failed(&self) -> usize {
        self.report.failed_count()
    }

    pub fn skipped_locked(&self) -> usize {
        self.report.skipped_locked
    }

    pub fn skipped_quota(&self) -> usize {
        self.report.skipped_quota
    }
}

/// Everything a pass decided before touching the filesystem.
#[derive(Debug)]
pub struct PassPlan {
    pub inventory: Inventory,
    pub decision: RetentionDecision,
    pub disk_usage: Option<DiskUsage>,
    pub now: DateTime<Utc>,
    pub scan_duration: Duration,
}

/// Releases the single-flight flag when a pass ends, however it ends.
struct PassGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self, Error> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::PassInProgress)?;
        Ok(Self { running })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl RetentionEngine {
    /// Validates the configuration up front; a bad config never reaches a pass.
    pub fn new(
        config: AppConfig,
        locks: Arc<dyn LockSource>,
        audit: Arc<dyn AuditLog>,
    ) -> Result<Self, Error> {
        let settings = config.settings()?;
        Ok(Self {
            config,
            settings,
            locks,
            audit,
            disk: Arc::new(Fs2Probe),
            running: AtomicBool::new(false),
            cancel_token: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_disk_probe(mut self, probe: Arc<dyn DiskProbe>) -> Self {
        self.disk = probe;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &RetentionSettings {
        &self.settings
    }

    /// Shared flag; once set, running passes stop between files and new ones
    /// refuse to start.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn scan(&self) -> Result<Inventory, Error> {
        scanner::scan_inventory(
            &self.config.scan_root,
            &self.settings.allow_list,
            &self.config.ignore_patterns,
        )
    }

    /// Scan, read locks, and decide, without deleting anything.
    pub fn plan(&self, reporter: &dyn ProgressReporter) -> Result<PassPlan, Error> {
        let now = Utc::now();

        reporter.on_scan_start(&self.config.scan_root.to_string_lossy());
        let scan_start = Instant::now();
        let inventory = self.scan()?;
        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(
            inventory.clips.len(),
            inventory.rejected.len(),
            scan_duration.as_secs_f64(),
        );
        debug!(
            "Scan completed in {:.2}s: {} clips, {} rejected entries",
            scan_duration.as_secs_f64(),
            inventory.clips.len(),
            inventory.rejected.len()
        );

        let locks = LockSet::from_paths(self.locks.locked_clip_paths()?);
        debug!("{} reviewer locks in effect", locks.len());

        let planner = Planner::new(&self.settings);
        let clips = inventory.clips.clone();
        let (decision, disk_usage) = match self.settings.mode {
            RetentionMode::Age => (planner.plan_age(clips, &locks, now), None),
            RetentionMode::Usage => {
                let usage = self.disk.usage(&self.config.scan_root)?;
                (planner.plan_usage(clips, &locks, usage), Some(usage))
            }
        };
        reporter.on_plan_complete(decision.to_delete.len(), decision.bytes_to_free());

        Ok(PassPlan {
            inventory,
            decision,
            disk_usage,
            now,
            scan_duration,
        })
    }

    /// One full eviction pass. Refuses to overlap with another pass.
    pub fn run_pass(&self, reporter: &dyn ProgressReporter) -> Result<PassSummary, Error> {
        let _guard = PassGuard::acquire(&self.running)?;
        if self.cancel_token.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }

        let start = Instant::now();
        let started_at = Utc::now();
        info!(
            "Retention pass started ({:?} mode) on {}",
            self.settings.mode,
            self.config.scan_root.display()
        );

        let plan = self.plan(reporter)?;
        let warnings = plan.decision.warnings();
        for warning in &warnings {
            warn!("{}", warning);
        }

        let report = DeletionExecutor::new(self.audit.as_ref(), &self.cancel_token)
            .dry_run(self.settings.dry_run)
            .execute(&plan.decision, reporter);

        let summary = PassSummary {
            mode: self.settings.mode,
            started_at,
            scan_duration: plan.scan_duration,
            total_duration: start.elapsed(),
            clips_scanned: plan.inventory.clips.len(),
            rejected_entries: plan.inventory.rejected.len(),
            disk_usage: plan.disk_usage,
            candidates: plan.decision.to_delete.len(),
            capped: plan.decision.capped,
            report,
            warnings,
        };

        info!(
            "Retention pass finished in {:.2}s: {} deleted, {} failed, {} skipped (locked), {} skipped (quota)",
            summary.total_duration.as_secs_f64(),
            summary.deleted(),
            summary.failed(),
            summary.skipped_locked(),
            summary.skipped_quota()
        );

        Ok(summary)
    }
}
