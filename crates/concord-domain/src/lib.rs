//! Imperative evaluation (no IO).
//!
//! Input: a validated contract, a validator registry, and an immutable input snapshot.
//! Output: per-rule validation results with structured evidence, the consistency check
//! against a declarative verdict, and the exit decision for an agreed verdict.

#![forbid(unsafe_code)]

pub mod checks;
pub mod collector;
pub mod consistency;
pub mod exit;
pub mod registry;
pub mod snapshot;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use collector::{Parallelism, run_all, run_all_with};
pub use consistency::{
    AgreedVerdict, BucketDrift, ConsistencyOutcome, ConsistencyViolation, Layer, check,
    imperative_verdict,
};
pub use exit::{ExitDecision, ExitState, FatalExit};
pub use registry::{ConfigurationError, Outcome, Registry, Validator, ValidatorError};
pub use snapshot::{MissingField, Snapshot, SnapshotError};
