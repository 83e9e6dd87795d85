pub mod models;
pub mod queries;
pub mod sqlite;

pub use models::{DeletionAuditEntry, LockedClip};
pub use sqlite::Database;

use crate::collab::{AuditLog, LockSource};
use crate::error::Error;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe wrapper so one [`Database`] can back both collaborator traits
/// for an engine shared with the scheduler thread.
pub struct Store {
    db: Mutex<Database>,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: &str) -> Result<Self, Error> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Database>, Error> {
        self.db
            .lock()
            .map_err(|e| Error::Audit(format!("database mutex poisoned: {}", e)))
    }
}

impl LockSource for Store {
    fn locked_clip_paths(&self) -> Result<HashSet<String>, Error> {
        self.db()?
            .locked_clip_paths()
            .map_err(|e| Error::LockSource(e.to_string()))
    }
}

impl AuditLog for Store {
    fn record_deletion(&self, filename: &str) -> Result<(), Error> {
        self.db()?.record_deletion(filename)?;
        Ok(())
    }

    fn has_deletion_record(&self, filename: &str) -> Result<bool, Error> {
        Ok(self.db()?.has_deletion_record(filename)?)
    }
}
