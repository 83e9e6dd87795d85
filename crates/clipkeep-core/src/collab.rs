//! Seams to the systems this engine depends on but does not own.

use crate::error::Error;
use crate::storage::DeletionAuditEntry;
use std::collections::HashSet;
use std::sync::Mutex;

/// Reviewer-protected clip paths, owned by the review subsystem.
pub trait LockSource: Send + Sync {
    fn locked_clip_paths(&self) -> Result<HashSet<String>, Error>;
}

/// Append-only record of deletions.
pub trait AuditLog: Send + Sync {
    fn record_deletion(&self, filename: &str) -> Result<(), Error>;
    fn has_deletion_record(&self, filename: &str) -> Result<bool, Error>;
}

impl LockSource for HashSet<String> {
    fn locked_clip_paths(&self) -> Result<HashSet<String>, Error> {
        Ok(self.clone())
    }
}

/// Audit log kept in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<DeletionAuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<DeletionAuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record_deletion(&self, filename: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| Error::Audit(format!("audit log poisoned: {}", e)))?;
        let id = entries.len() as i64 + 1;
        entries.push(DeletionAuditEntry {
            id,
            filename: filename.to_string(),
            deleted_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(())
    }

    fn has_deletion_record(&self, filename: &str) -> Result<bool, Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| Error::Audit(format!("audit log poisoned: {}", e)))?;
        Ok(entries.iter().any(|entry| entry.filename == filename))
    }
}
