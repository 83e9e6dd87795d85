use crate::clip::{parse_clip, AllowList, ClipRecord, FileMeta};
use crate::error::{ClipError, Error};
use chrono::{DateTime, Utc};
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

/// A directory entry that did not make it into the inventory, and why.
#[derive(Debug)]
pub struct RejectedEntry {
    pub path: PathBuf,
    pub error: ClipError,
}

/// Immutable snapshot of the capture directory for one pass.
#[derive(Debug)]
pub struct Inventory {
    pub root: PathBuf,
    /// Sorted by path.
    pub clips: Vec<ClipRecord>,
    pub rejected: Vec<RejectedEntry>,
    pub scanned_at: DateTime<Utc>,
}

impl Inventory {
    pub fn total_bytes(&self) -> u64 {
        self.clips.iter().map(|c| c.size_bytes).sum()
    }
}

/// Walk `root` and parse every regular file into a [`ClipRecord`].
///
/// Per-entry failures land in `rejected`; only an unusable root is an error.
/// Symlinks are never followed and nothing on disk is modified. The root is
/// canonicalized first, so every clip path in the inventory is absolute.
pub fn scan_inventory(
    root: &Path,
    allow: &AllowList,
    ignore_globs: &[String],
) -> Result<Inventory, Error> {
    let root = check_root(root)?;
    let root = root.as_path();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let mut files: Vec<DirEntry> = Vec::new();
    let mut rejected: Vec<RejectedEntry> = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !ignore_patterns
                    .iter()
                    .any(|pattern| pattern.matches_path(entry.path()))
        });

    for entry_result in walker {
        match entry_result {
            Ok(entry) if entry.file_type().is_file() => files.push(entry),
            Ok(_) => {}
            Err(err) => {
                if err.depth() == 0 {
                    return Err(Error::ScanRootUnavailable {
                        path: root.to_path_buf(),
                        source: walk_error_to_io(err),
                    });
                }
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                warn!("Error reading entry {}: {}", path.display(), err);
                rejected.push(RejectedEntry {
                    path,
                    error: ClipError::StatFailed(walk_error_to_io(err)),
                });
            }
        }
    }

    let parsed: Vec<(PathBuf, Result<ClipRecord, ClipError>)> = files
        .par_iter()
        .map(|entry| {
            let path = entry.path();
            (path.to_path_buf(), parse_entry(entry, allow))
        })
        .collect();

    let mut clips: Vec<ClipRecord> = Vec::with_capacity(parsed.len());
    for (path, result) in parsed {
        match result {
            Ok(clip) => clips.push(clip),
            Err(error) => {
                match &error {
                    ClipError::FileTypeNotEligible { .. } => {
                        debug!("Skipping non-audio file {}: {}", path.display(), error)
                    }
                    _ => warn!("Skipping {}: {}", path.display(), error),
                }
                rejected.push(RejectedEntry { path, error });
            }
        }
    }

    clips.sort_by(|a, b| a.path.cmp(&b.path));
    rejected.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(Inventory {
        root: root.to_path_buf(),
        clips,
        rejected,
        scanned_at: Utc::now(),
    })
}

/// Resolve the root to an absolute, symlink-free directory we can list.
fn check_root(root: &Path) -> Result<PathBuf, Error> {
    let unavailable = |source: io::Error| Error::ScanRootUnavailable {
        path: root.to_path_buf(),
        source,
    };

    let canonical = fs::canonicalize(root).map_err(unavailable)?;
    let metadata = fs::metadata(&canonical).map_err(unavailable)?;
    if !metadata.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::Other,
            "not a directory",
        )));
    }
    fs::read_dir(&canonical).map_err(unavailable)?;
    Ok(canonical)
}

/// The extension gate runs before the stat so non-audio files are never touched.
fn parse_entry(entry: &DirEntry, allow: &AllowList) -> Result<ClipRecord, ClipError> {
    allow.check(entry.path())?;
    let metadata = entry
        .metadata()
        .map_err(|e| ClipError::StatFailed(walk_error_to_io(e)))?;
    parse_clip(entry.path(), FileMeta::from(&metadata), allow)
}

fn walk_error_to_io(err: walkdir::Error) -> io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message))
}
