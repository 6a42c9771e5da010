use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SCHEMA_CONTRACT_V1: &str = "concord.contract.v1";

/// Contract document schema v1, as written by contract authors.
///
/// Fields are kept loosely typed here so validation can report the offending rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContractDocV1 {
    /// Optional schema string for tooling (`concord.contract.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub rules: Vec<RuleDoc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleDoc {
    pub rule_id: String,

    /// `must`, `should`, or `have`.
    pub priority: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Field name -> `type` or `type?`. Derived from `check` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<BTreeMap<String, String>>,

    /// Built-in check binding, e.g. `{ kind = "present", path = "a.b" }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Value>,
}
