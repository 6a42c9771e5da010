use crate::chain::BrokenEntry;
use thiserror::Error;

/// The log could not be read or written.
#[derive(Debug, Error)]
pub enum WormError {
    #[error("audit log I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error(
        "audit log is locked by another writer ({path}); gave up after {attempts} attempts. \
         Remove the lock file if no concord process is running."
    )]
    LockTimeout { path: String, attempts: u32 },

    #[error("audit log line {line} is unreadable: {message}")]
    Corrupt { line: usize, message: String },

    #[error("correction references entry {0}, which does not exist")]
    UnknownEntry(u64),

    #[error("failed to encode audit entry: {0}")]
    Encode(String),
}

impl WormError {
    pub(crate) fn io(path: impl ToString, err: impl ToString) -> Self {
        WormError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// The chain failed verification. Never repaired automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "audit chain integrity violation: entry #{first} and {} later entr(ies) are broken ({})",
    later(.broken),
    first_reason(.broken)
)]
pub struct IntegrityViolation {
    /// `seq` of the first broken entry.
    pub first: u64,
    pub broken: Vec<BrokenEntry>,
}

fn later(broken: &[BrokenEntry]) -> usize {
    broken.len().saturating_sub(1)
}

fn first_reason(broken: &[BrokenEntry]) -> String {
    broken
        .first()
        .map(|b| b.reason.to_string())
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Storage(#[from] WormError),
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),
}
