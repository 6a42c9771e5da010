use crate::evaluate::evaluate_input;
use crate::input::PolicyInput;
use concord_types::PolicyVerdict;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy engine {source_name} failed: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },

    #[error("policy engine {source_name} returned an invalid verdict: {message}")]
    InvalidVerdict {
        source_name: String,
        message: String,
    },
}

/// Something that turns a `PolicyInput` into a verdict using evidence only.
pub trait PolicyEngine {
    /// Label used in logs and consistency reports.
    fn source_name(&self) -> &str;

    fn evaluate(&self, input: &PolicyInput) -> Result<PolicyVerdict, PolicyError>;
}

/// The built-in declarative evaluator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Declarative;

impl PolicyEngine for Declarative {
    fn source_name(&self) -> &str {
        "declarative"
    }

    fn evaluate(&self, input: &PolicyInput) -> Result<PolicyVerdict, PolicyError> {
        Ok(evaluate_input(input))
    }
}

/// Parse a verdict produced outside the process and reject shapes `record` can never build:
/// a rule in two buckets, or a rule the input did not contain.
pub fn parse_verdict(
    source_name: &str,
    bytes: &[u8],
    input: &PolicyInput,
) -> Result<PolicyVerdict, PolicyError> {
    let invalid = |message: String| PolicyError::InvalidVerdict {
        source_name: source_name.to_string(),
        message,
    };

    let verdict: PolicyVerdict =
        serde_json::from_slice(bytes).map_err(|e| invalid(e.to_string()))?;

    let overlap = verdict.overlapping();
    if !overlap.is_empty() {
        return Err(invalid(format!(
            "rules in more than one bucket: {}",
            join(&overlap)
        )));
    }

    let known: BTreeSet<&str> = input.rules.iter().map(|r| r.rule_id.as_str()).collect();
    let unknown: BTreeSet<String> = [&verdict.deny, &verdict.warn, &verdict.info]
        .into_iter()
        .flatten()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(invalid(format!("unknown rules: {}", join(&unknown))));
    }
    Ok(verdict)
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().cloned().collect::<Vec<_>>().join(", ")
}
