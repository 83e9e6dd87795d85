use super::quota::QuotaGuard;
use crate::clip::{oldest_first, ClipRecord};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Capacity of the filesystem holding the scan root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

impl DiskUsage {
    pub fn free_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        self.free_bytes as f64 / self.total_bytes as f64
    }

    /// Free bytes needed to satisfy `min_free_ratio`, rounded up.
    pub fn target_free_bytes(&self, min_free_ratio: f64) -> u64 {
        (self.total_bytes as f64 * min_free_ratio).ceil() as u64
    }
}

#[derive(Debug, Default)]
pub struct UsageSelection<'a> {
    pub triggered: bool,
    /// Oldest first, and only as many as the target needs.
    pub selected: Vec<&'a ClipRecord>,
    /// Clips the quota guard withheld that the walk would otherwise have reached.
    pub vetoed: usize,
    /// Bytes still missing after taking every quota-safe clip.
    pub shortfall_bytes: Option<u64>,
    /// Last clip selected before the target was met; `None` when nothing was
    /// selected or when the whole pool was exhausted.
    pub stopped_at: Option<&'a ClipRecord>,
}

impl<'a> UsageSelection<'a> {
    /// Whether an unguarded oldest-first walk would have reached `clip`
    /// before this selection stopped.
    pub fn would_reach(&self, clip: &ClipRecord) -> bool {
        if !self.triggered {
            return false;
        }
        match self.stopped_at {
            Some(last) => oldest_first(clip, last) == Ordering::Less,
            None => self.shortfall_bytes.is_some(),
        }
    }
}

/// Pick the oldest quota-safe clips until projected free space meets the target.
///
/// The pool is the eligible population after the quota guard has removed
/// what it must keep, so reaching the target never costs a species its
/// minimum. If the pool runs dry first, everything in it is returned along
/// with the remaining shortfall.
pub fn select_by_usage<'a>(
    eligible: &'a [ClipRecord],
    usage: DiskUsage,
    min_free_ratio: f64,
    guard: &QuotaGuard<'_>,
    initial_counts: &HashMap<String, usize>,
) -> UsageSelection<'a> {
    let target = usage.target_free_bytes(min_free_ratio);
    if usage.free_bytes >= target {
        return UsageSelection::default();
    }

    let mut pool: Vec<&ClipRecord> = eligible.iter().filter(|clip| !clip.locked).collect();
    pool.sort_by(|a, b| oldest_first(a, b));
    let outcome = guard.enforce(pool, initial_counts);

    let mut selection = UsageSelection {
        triggered: true,
        ..UsageSelection::default()
    };
    let mut projected_free = usage.free_bytes;
    for clip in outcome.kept {
        if projected_free >= target {
            break;
        }
        projected_free = projected_free.saturating_add(clip.size_bytes);
        selection.selected.push(clip);
        selection.stopped_at = Some(clip);
    }

    if projected_free < target {
        selection.shortfall_bytes = Some(target - projected_free);
        selection.stopped_at = None;
    }

    selection.vetoed = outcome
        .vetoed
        .iter()
        .filter(|clip| selection.would_reach(clip))
        .count();

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AudioExtension;
    use crate::retention::quota::{species_counts, SpeciesQuota, TrimOrder};
    use chrono::{Duration, TimeZone, Utc};
    use std::path::PathBuf;

    fn clip(species: &str, days_old: i64, size: u64) -> ClipRecord {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        ClipRecord {
            path: PathBuf::from(format!("/clips/{}_{}.wav", species, days_old)),
            species: species.to_string(),
            confidence_percent: 80,
            captured_at: now - Duration::days(days_old),
            size_bytes: size,
            extension: AudioExtension::Wav,
            locked: false,
        }
    }

    #[test]
    fn test_not_triggered_when_enough_free_space() {
        let clips = vec![clip("owl", 10, 100)];
        let quota = SpeciesQuota::uniform(0);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);
        let usage = DiskUsage {
            total_bytes: 1000,
            free_bytes: 500,
        };

        let selection = select_by_usage(&clips, usage, 0.2, &guard, &species_counts(&clips));
        assert!(!selection.triggered);
        assert!(selection.selected.is_empty());
    }

    #[test]
    fn test_selects_oldest_until_target_met() {
        let clips = vec![
            clip("owl", 5, 100),
            clip("owl", 50, 100),
            clip("duck", 40, 100),
            clip("duck", 10, 100),
        ];
        let quota = SpeciesQuota::uniform(0);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);
        // Target 300 free, 120 free now: needs two 100-byte clips.
        let usage = DiskUsage {
            total_bytes: 1000,
            free_bytes: 120,
        };

        let selection = select_by_usage(&clips, usage, 0.3, &guard, &species_counts(&clips));
        assert!(selection.triggered);
        let names: Vec<_> = selection.selected.iter().map(|c| c.file_name()).collect();
        assert_eq!(names, vec!["owl_50.wav", "duck_40.wav"]);
        assert_eq!(selection.shortfall_bytes, None);
    }

    #[test]
    fn test_reports_shortfall_instead_of_breaking_quota() {
        let clips = vec![clip("owl", 30, 100), clip("owl", 20, 100), clip("owl", 10, 100)];
        let quota = SpeciesQuota::uniform(2);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);
        let usage = DiskUsage {
            total_bytes: 1000,
            free_bytes: 0,
        };

        let selection = select_by_usage(&clips, usage, 0.5, &guard, &species_counts(&clips));
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].file_name(), "owl_30.wav");
        assert_eq!(selection.shortfall_bytes, Some(400));
        assert_eq!(selection.vetoed, 2);
    }

    #[test]
    fn test_vetoes_past_stop_point_are_not_counted() {
        let clips = vec![
            clip("owl", 90, 100),
            clip("owl", 80, 100),
            clip("owl", 1, 100),
        ];
        let quota = SpeciesQuota::uniform(1);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);
        let usage = DiskUsage {
            total_bytes: 1000,
            free_bytes: 0,
        };

        // Target 100: the 90-day clip alone is enough; the vetoed 1-day clip
        // was never going to be reached.
        let selection = select_by_usage(&clips, usage, 0.1, &guard, &species_counts(&clips));
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.vetoed, 0);
    }
}
