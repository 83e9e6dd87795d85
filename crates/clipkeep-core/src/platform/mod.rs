use crate::retention::DiskUsage;
use std::io;
use std::path::Path;

/// Reports capacity of the filesystem a path lives on.
pub trait DiskProbe: Send + Sync {
    fn usage(&self, path: &Path) -> io::Result<DiskUsage>;
}

/// Probe backed by `statvfs` / `GetDiskFreeSpaceEx` through `fs2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fs2Probe;

impl DiskProbe for Fs2Probe {
    fn usage(&self, path: &Path) -> io::Result<DiskUsage> {
        Ok(DiskUsage {
            total_bytes: fs2::total_space(path)?,
            free_bytes: fs2::available_space(path)?,
        })
    }
}

/// Fixed reading, for embedding callers that already know the numbers.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub DiskUsage);

impl DiskProbe for StaticProbe {
    fn usage(&self, _path: &Path) -> io::Result<DiskUsage> {
        Ok(self.0)
    }
}
