use crate::result::{EvidenceMap, ValidationResult};
use crate::verdict::PolicyVerdict;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Stable schema identifiers for concord documents.
pub const SCHEMA_REPORT_V1: &str = "concord.report.v1";
pub const SCHEMA_EVIDENCE_V1: &str = "concord.evidence.v1";

/// What the declarative layer may know about one rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceEntry {
    pub ok: bool,
    #[schemars(with = "BTreeMap<String, Value>")]
    pub evidence: EvidenceMap,
    pub message: String,
}

/// `rule_id -> {ok, evidence, message}` for one run.
///
/// Keys are ordered, so the JSON encoding is byte-for-byte deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EvidenceReport(BTreeMap<String, EvidenceEntry>);

impl EvidenceReport {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        Self(
            results
                .iter()
                .map(|r| {
                    (
                        r.rule_id.clone(),
                        EvidenceEntry {
                            ok: r.passed,
                            evidence: r.evidence.clone(),
                            message: r.message.clone(),
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn get(&self, rule_id: &str) -> Option<&EvidenceEntry> {
        self.0.get(rule_id)
    }

    pub fn entries(&self) -> &BTreeMap<String, EvidenceEntry> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop the entry for `rule_id`. Used to model evidence gaps.
    pub fn without(mut self, rule_id: &str) -> Self {
        self.0.remove(rule_id);
        self
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl FromIterator<(String, EvidenceEntry)> for EvidenceReport {
    fn from_iter<T: IntoIterator<Item = (String, EvidenceEntry)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Exit decision as exported to collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExitSummary {
    pub code: i32,
    /// `pass`, `soft_fail`, or `hard_fail`.
    pub decision: String,
}

/// Run counters for the report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunData {
    pub rules_evaluated: u32,
    pub rules_passed: u32,
    pub engine_errors: u32,
    /// Set when the run was restricted with a rule filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_rules: Option<Vec<String>>,
    /// Whether an external evaluator was consulted and agreed.
    #[serde(default)]
    pub external_cross_check: bool,
}

/// Location of the audit entry written for a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuditPointer {
    pub seq: u64,
    pub payload_hash: String,
}

/// Run report handed to outer collaborators (report renderers, CI glue).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    /// Versioned schema identifier for the report shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub contract_digest: String,
    pub verdict: PolicyVerdict,
    pub exit: ExitSummary,
    pub data: RunData,
    pub evidence: EvidenceReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditPointer>,
}
