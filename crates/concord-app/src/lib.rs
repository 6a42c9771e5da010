//! Use case orchestration for concord.
//!
//! This crate provides the application layer: use cases that coordinate the contract, domain,
//! policy, and audit layers. It owns file access; the layers below it are I/O-free apart from
//! the audit log.
//!
//! The CLI crate depends on this; it only handles argument parsing and process exit.

#![forbid(unsafe_code)]

mod audit;
mod check;
mod cross_check;
mod explain;
mod fault;
mod load;

#[cfg(test)]
mod test_support;

pub use audit::{AuditOutput, format_verification, run_correct_audit, run_verify_audit};
pub use check::{CheckInput, CheckOutput, run_check};
pub use cross_check::CommandEngine;
pub use explain::{
    ExplainOutput, format_explanation, format_not_found, format_rule, format_rules, run_explain,
};
pub use fault::classify_fault;
pub use load::{load_contract, load_snapshot, resolve_settings};
