//! Stable DTOs and IDs used across the concord workspace.
//!
//! This crate is intentionally boring:
//! - rule, evidence, and verdict data types shared by both evaluation layers
//! - stable string IDs, schema identifiers, and the engine-error marker
//! - canonical field paths into input snapshots
//! - explain registry for built-in check kinds and codes

#![forbid(unsafe_code)]

pub mod check;
pub mod explain;
pub mod ids;
pub mod path;
pub mod report;
pub mod result;
pub mod rule;
pub mod verdict;

pub use check::CheckSpec;
pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use path::{FieldPath, Segment};
pub use report::{
    AuditPointer, EvidenceEntry, EvidenceReport, ExitSummary, RunData, RunReport, SCHEMA_EVIDENCE_V1,
    SCHEMA_REPORT_V1, ToolMeta,
};
pub use result::{EvidenceMap, ValidationResult};
pub use rule::{EvidenceSchema, FieldSpec, FieldType, Priority, Rule, SchemaMismatch};
pub use verdict::{Bucket, PolicyVerdict};
