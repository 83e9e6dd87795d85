use std::path::PathBuf;
use thiserror::Error;

/// Pass-level errors. Any of these aborts the pass before a single file is removed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scan root {} is unavailable: {source}", path.display())]
    ScanRootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock source query failed: {0}")]
    LockSource(String),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("A retention pass is already in progress")]
    PassInProgress,

    #[error("Operation cancelled")]
    Cancelled,
}

/// Per-file errors. These are collected against a single path and never abort a pass.
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("file type not eligible for cleanup: {extension:?}")]
    FileTypeNotEligible { extension: Option<String> },

    #[error("malformed clip filename: {reason}")]
    MalformedFilename { reason: String },

    #[error("failed to stat file: {0}")]
    StatFailed(#[source] std::io::Error),

    #[error("failed to delete file: {0}")]
    DeleteFailed(#[source] std::io::Error),

    #[error("file deleted but audit record failed: {0}")]
    AuditFailed(String),
}

impl ClipError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ClipError::MalformedFilename {
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions worth surfacing in the pass summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassWarning {
    /// The usage target cannot be reached without breaking a species quota.
    QuotaUnsatisfiable { shortfall_bytes: u64 },
}

impl std::fmt::Display for PassWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassWarning::QuotaUnsatisfiable { shortfall_bytes } => write!(
                f,
                "free space target unreachable without violating species quotas ({} bytes short)",
                shortfall_bytes
            ),
        }
    }
}
