//! Write-once audit log.
//!
//! Every trusted run appends one entry whose `previous_hash` is the previous entry's
//! `payload_hash`. The log is verifiable from its bytes alone. Nothing here ever edits,
//! removes, or repairs an entry.

#![forbid(unsafe_code)]

mod chain;
mod entry;
mod error;
mod lock;
mod storage;

pub use chain::{BrokenEntry, BrokenReason, ChainVerification, WormLog};
pub use entry::{CORRECTION_KEY, GENESIS_HASH, WormEntry, hash_payload};
pub use error::{AuditError, IntegrityViolation, WormError};
pub use lock::LockFile;
pub use storage::{FileStorage, MemoryStorage, StorageGuard, WormStorage};
