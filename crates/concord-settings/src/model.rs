use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_CONFIG_V1: &str = "concord.config.v1";

/// `concord.toml` schema v1.
///
/// Every key is optional; unset keys fall back to CLI flags or defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConcordConfigV1 {
    /// Optional schema string for tooling (`concord.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Rule contract path (`.toml` or `.json`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,

    /// Audit log path (JSON lines).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<String>,

    /// Where `check` writes its run report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_out: Option<String>,

    /// Validator threads. Unset uses the global pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,

    /// Write trusted verdicts to the audit log (default true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<bool>,

    /// External declarative evaluator command, run through the shell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_cmd: Option<String>,
}
