use concord_types::{EvidenceReport, Priority, Rule};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The slice of a rule the declarative layer is allowed to know.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleRef {
    pub rule_id: String,
    pub priority: Priority,
}

impl From<&Rule> for RuleRef {
    fn from(rule: &Rule) -> Self {
        Self {
            rule_id: rule.rule_id.clone(),
            priority: rule.priority,
        }
    }
}

/// Document handed to a declarative evaluator, internal or external.
///
/// JSON shape: `{"rules": [{"rule_id", "priority"}], "evidence": {rule_id: {ok, evidence, message}}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyInput {
    pub rules: Vec<RuleRef>,
    pub evidence: EvidenceReport,
}

impl PolicyInput {
    pub fn new(rules: &[Rule], evidence: EvidenceReport) -> Self {
        Self {
            rules: rules.iter().map(RuleRef::from).collect(),
            evidence,
        }
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
