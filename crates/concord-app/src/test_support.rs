//! Temp-dir fixtures for use case tests.

use camino::{Utf8Path, Utf8PathBuf};
use concord_audit::{FileStorage, WormLog};
use concord_policy::{PolicyEngine, PolicyError, PolicyInput};
use concord_settings::Overrides;
use concord_types::PolicyVerdict;
use serde_json::Value;
use tempfile::TempDir;

/// A temp dir holding a contract, snapshots, and an audit log.
pub struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    /// Writes `contract` to `concord.contract.toml` unless it is empty.
    pub fn new(contract: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let ws = Self { _dir: dir, root };
        if !contract.is_empty() {
            ws.write_text("concord.contract.toml", contract);
        }
        ws
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.root
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            contract: Some(self.root.join("concord.contract.toml").to_string()),
            audit_log: Some(self.audit_path().to_string()),
            ..Overrides::default()
        }
    }

    pub fn audit_path(&self) -> Utf8PathBuf {
        self.root.join("audit.jsonl")
    }

    pub fn audit_log(&self) -> WormLog<FileStorage> {
        WormLog::open(self.audit_path())
    }

    pub fn write_text(&self, name: &str, text: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, text).expect("write file");
        path
    }

    pub fn write_snapshot(&self, name: &str, value: &Value) -> Utf8PathBuf {
        self.write_text(name, &value.to_string())
    }

    /// Replace `from` with `to` in the raw audit log bytes.
    pub fn tamper_audit_log(&self, from: &str, to: &str) {
        let path = self.audit_path();
        let text = std::fs::read_to_string(&path).expect("read audit log");
        assert!(text.contains(from), "audit log does not contain {from}");
        std::fs::write(&path, text.replacen(from, to, 1)).expect("write audit log");
    }
}

/// External evaluator that always returns the same verdict.
pub struct FixedEngine(pub PolicyVerdict);

impl PolicyEngine for FixedEngine {
    fn source_name(&self) -> &str {
        "fixed"
    }

    fn evaluate(&self, _input: &PolicyInput) -> Result<PolicyVerdict, PolicyError> {
        Ok(self.0.clone())
    }
}

/// Engine that denies `rule_id` no matter what the evidence says.
pub fn disagreeing_engine(rule_id: &str) -> FixedEngine {
    let mut verdict = PolicyVerdict::default();
    verdict.deny.insert(rule_id.to_string());
    FixedEngine(verdict)
}
