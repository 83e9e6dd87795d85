use super::AudioExtension;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::PathBuf;

/// One audio clip on disk, identified by its path and described by its filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipRecord {
    pub path: PathBuf,
    pub species: String,
    pub confidence_percent: u8,
    pub captured_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub extension: AudioExtension,
    /// Set by the lock filter; always false straight out of the parser.
    pub locked: bool,
}

impl ClipRecord {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Oldest capture first, ties broken by path.
pub fn oldest_first(a: &ClipRecord, b: &ClipRecord) -> Ordering {
    a.captured_at
        .cmp(&b.captured_at)
        .then_with(|| a.path.cmp(&b.path))
}

/// Newest capture first, ties broken by path.
pub fn newest_first(a: &ClipRecord, b: &ClipRecord) -> Ordering {
    b.captured_at
        .cmp(&a.captured_at)
        .then_with(|| a.path.cmp(&b.path))
}
