use crate::clip::{oldest_first, ClipRecord};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Start of the retention window: anything captured before this is too old.
/// `None` when the horizon reaches back past the representable range.
pub fn age_cutoff(now: DateTime<Utc>, horizon: Duration) -> Option<DateTime<Utc>> {
    let horizon = chrono::Duration::from_std(horizon).ok()?;
    now.checked_sub_signed(horizon)
}

/// Every unlocked clip captured strictly before `now - horizon`, oldest first.
pub fn select_by_age<'a>(
    eligible: &'a [ClipRecord],
    now: DateTime<Utc>,
    horizon: Duration,
) -> Vec<&'a ClipRecord> {
    let Some(cutoff) = age_cutoff(now, horizon) else {
        return Vec::new();
    };

    let mut selected: Vec<&ClipRecord> = eligible
        .iter()
        .filter(|clip| !clip.locked && clip.captured_at < cutoff)
        .collect();
    selected.sort_by(|a, b| oldest_first(a, b));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AudioExtension;
    use chrono::TimeZone;
    use std::path::PathBuf;

    const DAY: u64 = 24 * 60 * 60;

    fn clip_aged(now: DateTime<Utc>, days: i64) -> ClipRecord {
        ClipRecord {
            path: PathBuf::from(format!("/clips/owl_{}d.wav", days)),
            species: "owl".to_string(),
            confidence_percent: 80,
            captured_at: now - chrono::Duration::days(days),
            size_bytes: 1024,
            extension: AudioExtension::Wav,
            locked: false,
        }
    }

    #[test]
    fn test_selects_only_clips_past_horizon() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clips: Vec<_> = [1, 2, 30, 60, 90].iter().map(|d| clip_aged(now, *d)).collect();

        let selected = select_by_age(&clips, now, Duration::from_secs(7 * DAY));
        let paths: Vec<_> = selected.iter().map(|c| c.file_name()).collect();
        assert_eq!(paths, vec!["owl_90d.wav", "owl_60d.wav", "owl_30d.wav"]);
    }

    #[test]
    fn test_clip_exactly_at_cutoff_is_kept() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clips = vec![clip_aged(now, 7)];
        assert!(select_by_age(&clips, now, Duration::from_secs(7 * DAY)).is_empty());
    }

    #[test]
    fn test_locked_clips_never_selected() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut clips = vec![clip_aged(now, 90)];
        clips[0].locked = true;
        assert!(select_by_age(&clips, now, Duration::from_secs(DAY)).is_empty());
    }

    #[test]
    fn test_unbounded_horizon_selects_nothing() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clips = vec![clip_aged(now, 90)];
        assert!(select_by_age(&clips, now, Duration::MAX).is_empty());
    }
}
