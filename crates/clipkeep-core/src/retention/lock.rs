use crate::clip::ClipRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Reviewer locks, read once at the start of a pass.
///
/// Absolute entries must match a clip path exactly. Relative entries, as the
/// review subsystem stores them, match when they form the trailing
/// components of a clip path.
#[derive(Debug, Clone, Default)]
pub struct LockSet {
    absolute: HashSet<PathBuf>,
    relative: Vec<PathBuf>,
}

impl LockSet {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = LockSet::default();
        for raw in paths {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let path = PathBuf::from(raw);
            if path.is_absolute() {
                set.absolute.insert(path);
            } else if !set.relative.contains(&path) {
                set.relative.push(path);
            }
        }
        set
    }

    pub fn is_locked(&self, path: &Path) -> bool {
        self.absolute.contains(path) || self.relative.iter().any(|rel| path.ends_with(rel))
    }

    pub fn len(&self) -> usize {
        self.absolute.len() + self.relative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The scan population split into what policies may consider and what they may not.
#[derive(Debug, Default)]
pub struct LockFiltered {
    pub eligible: Vec<ClipRecord>,
    pub locked: Vec<ClipRecord>,
}

/// Mark locked clips and pull them out of the eligible population.
/// Lock entries that match nothing in the scan are ignored.
pub fn apply_locks(clips: Vec<ClipRecord>, locks: &LockSet) -> LockFiltered {
    let mut filtered = LockFiltered::default();
    for mut clip in clips {
        if clip.locked || locks.is_locked(&clip.path) {
            clip.locked = true;
            filtered.locked.push(clip);
        } else {
            filtered.eligible.push(clip);
        }
    }
    filtered
}
