#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use clipkeep_core::clip::TIMESTAMP_LAYOUT;
use clipkeep_core::config::{AppConfig, RetentionConfig, RetentionMode};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `<species>_<confidence>p_<timestamp>.<ext>` captured `days_old` days before `now`.
pub fn write_clip(
    dir: &Path,
    species: &str,
    confidence: u8,
    now: DateTime<Utc>,
    days_old: i64,
    ext: &str,
    size: usize,
) -> PathBuf {
    let captured = now - Duration::days(days_old);
    let name = format!(
        "{}_{}p_{}.{}",
        species,
        confidence,
        captured.format(TIMESTAMP_LAYOUT),
        ext
    );
    let path = dir.join(name);
    fs::write(&path, vec![0u8; size]).unwrap();
    // Scans report canonical paths.
    fs::canonicalize(&path).unwrap()
}

pub fn age_config(root: &Path, max_age: &str, min_per_species: usize) -> AppConfig {
    AppConfig {
        scan_root: root.to_path_buf(),
        db_path: ":memory:".to_string(),
        ignore_patterns: vec![],
        retention: RetentionConfig {
            mode: RetentionMode::Age,
            max_age: max_age.to_string(),
            min_clips_per_species: min_per_species,
            ..RetentionConfig::default()
        },
    }
}

pub fn usage_config(root: &Path, min_free_ratio: f64, min_per_species: usize) -> AppConfig {
    AppConfig {
        scan_root: root.to_path_buf(),
        db_path: ":memory:".to_string(),
        ignore_patterns: vec![],
        retention: RetentionConfig {
            mode: RetentionMode::Usage,
            min_free_space_ratio: min_free_ratio,
            min_clips_per_species: min_per_species,
            ..RetentionConfig::default()
        },
    }
}
