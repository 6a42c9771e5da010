use crate::registry::{Outcome, ValidatorError};
use crate::snapshot::Snapshot;
use concord_contract::Contract;
use concord_types::{CheckSpec, EvidenceSchema, FieldSpec, Priority, Rule};
use serde_json::{Map, Value};

pub fn contract(rules: Vec<Rule>) -> Contract {
    Contract::from_rules(rules).expect("valid test contract")
}

pub fn check_rule(rule_id: &str, priority: Priority, check: CheckSpec) -> Rule {
    Rule {
        rule_id: rule_id.to_string(),
        priority,
        title: format!("{rule_id} title"),
        description: None,
        evidence_schema: check.default_schema(),
        check: Some(check),
    }
}

pub fn present_rule(rule_id: &str, path: &str) -> Rule {
    check_rule(
        rule_id,
        Priority::Must,
        CheckSpec::Present {
            path: path.to_string(),
        },
    )
}

pub fn equals_rule(rule_id: &str, priority: Priority, path: &str, value: Value) -> Rule {
    check_rule(
        rule_id,
        priority,
        CheckSpec::Equals {
            path: path.to_string(),
            value,
        },
    )
}

/// Rule with no built-in check; evidence is `{ "note": string? }`.
pub fn custom_rule(rule_id: &str) -> Rule {
    custom_rule_with(rule_id, Priority::Must, &[("note", "string?")])
}

pub fn custom_rule_with(rule_id: &str, priority: Priority, fields: &[(&str, &str)]) -> Rule {
    let evidence_schema: EvidenceSchema = fields
        .iter()
        .map(|(name, ty)| {
            let spec: FieldSpec = ty.parse().expect("valid field spec");
            (name.to_string(), spec)
        })
        .collect();
    Rule {
        rule_id: rule_id.to_string(),
        priority,
        title: format!("{rule_id} title"),
        description: None,
        evidence_schema,
        check: None,
    }
}

pub fn snapshot(value: Value) -> Snapshot {
    Snapshot::new(value)
}

pub fn passing(_: &Rule, _: &Snapshot) -> Result<Outcome, ValidatorError> {
    Ok(Outcome::pass("custom ok", Map::new()))
}

pub fn failing(_: &Rule, _: &Snapshot) -> Result<Outcome, ValidatorError> {
    Ok(Outcome::fail("custom failed", Map::new()))
}
