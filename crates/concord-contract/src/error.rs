use thiserror::Error;

/// Why a contract could not be loaded. Always fatal: no partial contract is ever active.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("contract is not valid {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("unsupported contract format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("unsupported contract schema: {0} (expected concord.contract.v1)")]
    UnsupportedSchema(String),

    #[error("contract declares no rules")]
    Empty,

    #[error("rule #{index} has an empty rule_id")]
    EmptyRuleId { index: usize },

    #[error("duplicate rule_id: {0}")]
    DuplicateRuleId(String),

    #[error("rule {rule_id}: {message}")]
    InvalidPriority { rule_id: String, message: String },

    #[error("rule {rule_id}: malformed evidence schema: {message}")]
    MalformedSchema { rule_id: String, message: String },

    #[error("rule {rule_id}: invalid check: {message}")]
    InvalidCheck { rule_id: String, message: String },

    #[error("rule filter names unknown rule_id: {0}")]
    UnknownRule(String),
}
