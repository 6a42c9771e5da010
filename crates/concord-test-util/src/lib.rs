//! Shared test utilities for the concord workspace.
//!
//! `xtask` and the CLI integration tests both compare JSON documents that carry wall-clock
//! timestamps, so the normalization lives in a regular crate rather than a `#[cfg(test)]`
//! module.

use serde_json::Value;

pub const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";
pub const VERSION_PLACEHOLDER: &str = "__VERSION__";
pub const HASH_PLACEHOLDER: &str = "__HASH__";

/// Normalize non-deterministic JSON fields for golden comparison.
///
/// 1. **Root-only**: `tool.version` becomes `"__VERSION__"` when the root object is a run
///    report (`schema`, `tool`, `verdict`, `exit`, and `evidence` keys all present).
/// 2. **Recursive**: `started_at`, `finished_at`, and `timestamp` become `"__TIMESTAMP__"`
///    at any depth. Audit hashes (`payload_hash`, `previous_hash`) cover those timestamps,
///    so they become `"__HASH__"` unless they hold the genesis value.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_report = ["schema", "tool", "verdict", "exit", "evidence"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_report
            && let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
            && tool.contains_key("version")
        {
            tool.insert(
                "version".to_string(),
                Value::String(VERSION_PLACEHOLDER.to_string()),
            );
        }
    }
    normalize_recursive(&mut value);
    value
}

/// Normalize every line of a JSON-lines audit log.
pub fn normalize_audit_lines(text: &str) -> Vec<Value> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let v: Value = serde_json::from_str(l).unwrap_or(Value::String(l.to_string()));
            normalize_nondeterministic(v)
        })
        .collect()
}

fn normalize_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at", "timestamp"] {
                if map.contains_key(key) {
                    map.insert(
                        key.to_string(),
                        Value::String(TIMESTAMP_PLACEHOLDER.to_string()),
                    );
                }
            }
            for key in ["payload_hash", "previous_hash"] {
                if let Some(v) = map.get_mut(key)
                    && !is_genesis(v)
                {
                    *v = Value::String(HASH_PLACEHOLDER.to_string());
                }
            }
            for v in map.values_mut() {
                normalize_recursive(v);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                normalize_recursive(v);
            }
        }
        _ => {}
    }
}

fn is_genesis(v: &Value) -> bool {
    v.as_str()
        .is_some_and(|s| s.len() == 64 && s.bytes().all(|b| b == b'0'))
}
