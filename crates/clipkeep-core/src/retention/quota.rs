use crate::clip::{newest_first, oldest_first, ClipRecord};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Which over-quota candidates the guard hands back to the survivors first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimOrder {
    /// Veto the most recently captured candidates, so the oldest material is
    /// what gets deleted and the newest survives.
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Minimum number of clips each species keeps after a pass.
///
/// Species names are matched case-insensitively against the overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesQuota {
    default_min: usize,
    overrides: HashMap<String, usize>,
}

impl SpeciesQuota {
    pub fn new(default_min: usize, overrides: HashMap<String, usize>) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|(species, min)| (species.to_lowercase(), min))
            .collect();
        Self {
            default_min,
            overrides,
        }
    }

    pub fn uniform(default_min: usize) -> Self {
        Self::new(default_min, HashMap::new())
    }

    pub fn minimum_for(&self, species: &str) -> usize {
        self.overrides
            .get(&species.to_lowercase())
            .copied()
            .unwrap_or(self.default_min)
    }
}

/// Count clips per species. Feed it the whole inventory, locked clips included.
pub fn species_counts<'a, I>(clips: I) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a ClipRecord>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for clip in clips {
        *counts.entry(clip.species.clone()).or_default() += 1;
    }
    counts
}

#[derive(Debug, Default)]
pub struct GuardOutcome<'a> {
    /// Candidates that may be deleted, in their original order.
    pub kept: Vec<&'a ClipRecord>,
    pub vetoed: Vec<&'a ClipRecord>,
}

/// Final safety net between the policies and the executor.
pub struct QuotaGuard<'q> {
    quota: &'q SpeciesQuota,
    order: TrimOrder,
}

impl<'q> QuotaGuard<'q> {
    pub fn new(quota: &'q SpeciesQuota, order: TrimOrder) -> Self {
        Self { quota, order }
    }

    /// Veto just enough candidates per species that
    /// `initial_count - deleted >= minimum` holds afterwards.
    ///
    /// A species missing from `initial_counts` is treated as having no clips,
    /// so every candidate of it is vetoed.
    pub fn enforce<'a>(
        &self,
        candidates: Vec<&'a ClipRecord>,
        initial_counts: &HashMap<String, usize>,
    ) -> GuardOutcome<'a> {
        let mut by_species: HashMap<&str, Vec<&'a ClipRecord>> = HashMap::new();
        for &clip in &candidates {
            by_species.entry(clip.species.as_str()).or_default().push(clip);
        }

        let mut vetoed_paths: HashSet<&Path> = HashSet::new();
        for (species, mut group) in by_species {
            let initial = initial_counts.get(species).copied().unwrap_or(0);
            let allowed = initial.saturating_sub(self.quota.minimum_for(species));
            if group.len() <= allowed {
                continue;
            }

            match self.order {
                TrimOrder::NewestFirst => group.sort_by(|a, b| newest_first(a, b)),
                TrimOrder::OldestFirst => group.sort_by(|a, b| oldest_first(a, b)),
            }
            let excess = group.len() - allowed;
            vetoed_paths.extend(group.iter().take(excess).map(|c| c.path.as_path()));
        }

        let (vetoed, kept): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|clip| vetoed_paths.contains(clip.path.as_path()));

        GuardOutcome { kept, vetoed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AudioExtension;
    use chrono::{Duration, TimeZone, Utc};
    use std::path::PathBuf;

    fn clip(species: &str, days_old: i64) -> ClipRecord {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        ClipRecord {
            path: PathBuf::from(format!("/clips/{}_{}.wav", species, days_old)),
            species: species.to_string(),
            confidence_percent: 80,
            captured_at: now - Duration::days(days_old),
            size_bytes: 100,
            extension: AudioExtension::Wav,
            locked: false,
        }
    }

    #[test]
    fn test_minimum_for_uses_override_case_insensitively() {
        let mut overrides = HashMap::new();
        overrides.insert("Owl".to_string(), 4);
        let quota = SpeciesQuota::new(2, overrides);
        assert_eq!(quota.minimum_for("owl"), 4);
        assert_eq!(quota.minimum_for("OWL"), 4);
        assert_eq!(quota.minimum_for("duck"), 2);
    }

    #[test]
    fn test_newest_candidates_are_vetoed_first() {
        let clips = vec![clip("owl", 10), clip("owl", 20), clip("owl", 30)];
        let counts = species_counts(&clips);
        let quota = SpeciesQuota::uniform(2);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);

        let outcome = guard.enforce(clips.iter().collect(), &counts);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].path, clips[2].path);
        assert_eq!(outcome.vetoed.len(), 2);
    }

    #[test]
    fn test_oldest_first_trim_order() {
        let clips = vec![clip("owl", 10), clip("owl", 20), clip("owl", 30)];
        let counts = species_counts(&clips);
        let quota = SpeciesQuota::uniform(2);
        let guard = QuotaGuard::new(&quota, TrimOrder::OldestFirst);

        let outcome = guard.enforce(clips.iter().collect(), &counts);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].path, clips[0].path);
    }

    #[test]
    fn test_survivors_outside_candidate_set_count() {
        // Five owls on disk, only two are candidates; a minimum of three is
        // already satisfied by the three that are not candidates.
        let clips: Vec<_> = (1..=5).map(|d| clip("owl", d * 10)).collect();
        let counts = species_counts(&clips);
        let quota = SpeciesQuota::uniform(3);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);

        let outcome = guard.enforce(vec![&clips[3], &clips[4]], &counts);
        assert_eq!(outcome.kept.len(), 2);
        assert!(outcome.vetoed.is_empty());
    }

    #[test]
    fn test_kept_preserves_input_order() {
        let clips = vec![clip("owl", 30), clip("duck", 20), clip("owl", 10)];
        let counts = species_counts(&clips);
        let quota = SpeciesQuota::uniform(0);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);

        let outcome = guard.enforce(clips.iter().collect(), &counts);
        let kept: Vec<_> = outcome.kept.iter().map(|c| c.path.clone()).collect();
        let expected: Vec<_> = clips.iter().map(|c| c.path.clone()).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_unknown_species_is_fully_vetoed() {
        let clips = vec![clip("owl", 30)];
        let quota = SpeciesQuota::uniform(0);
        let guard = QuotaGuard::new(&quota, TrimOrder::NewestFirst);

        let outcome = guard.enforce(clips.iter().collect(), &HashMap::new());
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.vetoed.len(), 1);
    }
}
