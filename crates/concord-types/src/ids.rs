//! Stable identifiers for check kinds, codes, and report schemas.
//!
//! `check_kind` values are the snake_case names used in contract `check` tables.

pub const TOOL_NAME: &str = "concord";

/// Message prefix that marks a result produced by a validator fault rather than a rule failure.
pub const ENGINE_ERROR: &str = "ENGINE_ERROR";

/// Evidence key that carries the fault cause of an `ENGINE_ERROR` result.
pub const EVIDENCE_ERROR_KEY: &str = "error";

// Check kinds
pub const CHECK_PRESENT: &str = "present";
pub const CHECK_EQUALS: &str = "equals";
pub const CHECK_ONE_OF: &str = "one_of";
pub const CHECK_RANGE: &str = "range";
pub const CHECK_MATCHES: &str = "matches";
pub const CHECK_NON_EMPTY: &str = "non_empty";
pub const CHECK_ALL_PRESENT: &str = "all_present";

// Codes
pub const CODE_MISSING_FIELD: &str = "missing_field";
pub const CODE_TYPE_MISMATCH: &str = "type_mismatch";
pub const CODE_VALUE_MISMATCH: &str = "value_mismatch";
pub const CODE_OUT_OF_RANGE: &str = "out_of_range";
pub const CODE_EMPTY_VALUE: &str = "empty_value";
pub const CODE_ENGINE_ERROR: &str = "engine_error";
