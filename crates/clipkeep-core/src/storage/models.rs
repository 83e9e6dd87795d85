use serde::Serialize;

/// One completed deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionAuditEntry {
    pub id: i64,
    pub filename: String,
    /// RFC 3339, UTC.
    pub deleted_at: String,
}

/// A reviewer lock as stored in `locked_clip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedClip {
    pub clip_path: String,
    pub locked_at: String,
}
