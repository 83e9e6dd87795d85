use super::age::{age_cutoff, select_by_age};
use super::lock::{apply_locks, LockSet};
use super::quota::{species_counts, QuotaGuard};
use super::usage::{select_by_usage, DiskUsage};
use crate::clip::ClipRecord;
use crate::config::RetentionSettings;
use crate::error::PassWarning;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionReason {
    Age,
    Usage,
}

/// What a pass intends to delete, and what it held back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionDecision {
    /// Deletion order: oldest first.
    pub to_delete: Vec<ClipRecord>,
    pub reasons: BTreeMap<PathBuf, EvictionReason>,
    pub skipped_locked: usize,
    pub skipped_quota: usize,
    /// Candidates dropped by `max_deletions_per_pass`.
    pub capped: usize,
    pub shortfall_bytes: Option<u64>,
}

impl RetentionDecision {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty()
    }

    pub fn bytes_to_free(&self) -> u64 {
        self.to_delete.iter().map(|c| c.size_bytes).sum()
    }

    pub fn reason_for(&self, path: &Path) -> Option<EvictionReason> {
        self.reasons.get(path).copied()
    }

    pub fn warnings(&self) -> Vec<PassWarning> {
        self.shortfall_bytes
            .map(|shortfall_bytes| PassWarning::QuotaUnsatisfiable { shortfall_bytes })
            .into_iter()
            .collect()
    }
}

/// Runs lock filter, one policy and the quota guard over a scan snapshot.
pub struct Planner<'s> {
    settings: &'s RetentionSettings,
}

impl<'s> Planner<'s> {
    pub fn new(settings: &'s RetentionSettings) -> Self {
        Self { settings }
    }

    pub fn plan_age(
        &self,
        clips: Vec<ClipRecord>,
        locks: &LockSet,
        now: DateTime<Utc>,
    ) -> RetentionDecision {
        let counts = species_counts(&clips);
        let filtered = apply_locks(clips, locks);
        let guard = QuotaGuard::new(&self.settings.quota, self.settings.trim_order);

        let cutoff = age_cutoff(now, self.settings.max_age);
        let skipped_locked = filtered
            .locked
            .iter()
            .filter(|clip| cutoff.is_some_and(|t| clip.captured_at < t))
            .count();

        let candidates = select_by_age(&filtered.eligible, now, self.settings.max_age);
        debug!(
            "Age policy flagged {} of {} eligible clips (cutoff {:?})",
            candidates.len(),
            filtered.eligible.len(),
            cutoff
        );

        let outcome = guard.enforce(candidates, &counts);
        self.finish(
            outcome.kept,
            EvictionReason::Age,
            skipped_locked,
            outcome.vetoed.len(),
            None,
        )
    }

    pub fn plan_usage(
        &self,
        clips: Vec<ClipRecord>,
        locks: &LockSet,
        usage: DiskUsage,
    ) -> RetentionDecision {
        let counts = species_counts(&clips);
        let filtered = apply_locks(clips, locks);
        let guard = QuotaGuard::new(&self.settings.quota, self.settings.trim_order);

        let selection = select_by_usage(
            &filtered.eligible,
            usage,
            self.settings.min_free_space_ratio,
            &guard,
            &counts,
        );
        if !selection.triggered {
            debug!(
                "Usage policy idle: {:.1}% free, target {:.1}%",
                usage.free_ratio() * 100.0,
                self.settings.min_free_space_ratio * 100.0
            );
            return RetentionDecision::default();
        }

        let skipped_locked = filtered
            .locked
            .iter()
            .filter(|clip| selection.would_reach(clip))
            .count();

        let outcome = guard.enforce(selection.selected.clone(), &counts);
        self.finish(
            outcome.kept,
            EvictionReason::Usage,
            skipped_locked,
            selection.vetoed + outcome.vetoed.len(),
            selection.shortfall_bytes,
        )
    }

    fn finish(
        &self,
        mut kept: Vec<&ClipRecord>,
        reason: EvictionReason,
        skipped_locked: usize,
        skipped_quota: usize,
        shortfall_bytes: Option<u64>,
    ) -> RetentionDecision {
        let mut capped = 0;
        if let Some(limit) = self.settings.max_deletions_per_pass {
            if kept.len() > limit {
                capped = kept.len() - limit;
                kept.truncate(limit);
                warn!(
                    "Deletion cap of {} reached, deferring {} candidates to the next pass",
                    limit, capped
                );
            }
        }

        let to_delete: Vec<ClipRecord> = kept.into_iter().cloned().collect();
        let reasons = to_delete
            .iter()
            .map(|clip| (clip.path.clone(), reason))
            .collect();

        RetentionDecision {
            to_delete,
            reasons,
            skipped_locked,
            skipped_quota,
            capped,
            shortfall_bytes,
        }
    }
}
