use crate::ids;
use crate::rule::Priority;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured evidence emitted by a validator.
pub type EvidenceMap = Map<String, Value>;

/// Outcome of one rule for one run. Treated as a value: never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub rule_id: String,
    pub passed: bool,
    #[schemars(with = "std::collections::BTreeMap<String, Value>")]
    pub evidence: EvidenceMap,
    /// Copied from the rule at evaluation time.
    pub priority: Priority,
    pub message: String,
}

impl ValidationResult {
    /// Failed result standing in for a validator that panicked, errored, or broke its schema.
    pub fn engine_error(rule_id: &str, priority: Priority, cause: &str) -> Self {
        let mut evidence = Map::new();
        evidence.insert(
            ids::EVIDENCE_ERROR_KEY.to_string(),
            Value::String(cause.to_string()),
        );
        Self {
            rule_id: rule_id.to_string(),
            passed: false,
            evidence,
            priority,
            message: format!("{}: {cause}", ids::ENGINE_ERROR),
        }
    }

    pub fn is_engine_error(&self) -> bool {
        self.message.starts_with(ids::ENGINE_ERROR)
    }
}
