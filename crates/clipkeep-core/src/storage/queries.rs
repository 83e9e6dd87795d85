use super::models::*;
use super::sqlite::Database;
use rusqlite::{params, Result};
use std::collections::HashSet;
use tracing::debug;

impl Database {
    // ── Deletion audit ───────────────────────────────────────────

    pub fn record_deletion(&self, filename: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO deletion_audit (filename, deleted_at) VALUES (?1, ?2)",
            params![filename, now],
        )?;
        let id = self.connection().last_insert_rowid();
        debug!("Recorded deletion {} as audit entry {}", filename, id);
        Ok(id)
    }

    pub fn has_deletion_record(&self, filename: &str) -> Result<bool> {
        self.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM deletion_audit WHERE filename = ?1)",
            params![filename],
            |row| row.get(0),
        )
    }

    /// Newest first.
    pub fn recent_deletions(&self, limit: i64) -> Result<Vec<DeletionAuditEntry>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, filename, deleted_at FROM deletion_audit \
             ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(DeletionAuditEntry {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    deleted_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn deletion_count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM deletion_audit", [], |row| row.get(0))
    }

    // ── Reviewer locks ───────────────────────────────────────────

    pub fn locked_clip_paths(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT clip_path FROM locked_clip")?;
        let paths = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<String>>>()?;
        Ok(paths)
    }

    pub fn list_locked_clips(&self) -> Result<Vec<LockedClip>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT clip_path, locked_at FROM locked_clip ORDER BY clip_path")?;
        let locks = stmt
            .query_map([], |row| {
                Ok(LockedClip {
                    clip_path: row.get(0)?,
                    locked_at: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(locks)
    }

    /// Used by the review side of the house; the retention engine only reads.
    pub fn insert_locked_clip(&self, clip_path: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT OR IGNORE INTO locked_clip (clip_path, locked_at) VALUES (?1, ?2)",
            params![clip_path, now],
        )?;
        Ok(())
    }

    pub fn remove_locked_clip(&self, clip_path: &str) -> Result<bool> {
        let changed = self.connection().execute(
            "DELETE FROM locked_clip WHERE clip_path = ?1",
            params![clip_path],
        )?;
        Ok(changed > 0)
    }
}
