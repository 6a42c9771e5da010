use crate::registry::Outcome;
use crate::snapshot::MissingField;
use concord_types::{EvidenceMap, FieldPath, ids};
use serde_json::{Value, json};

/// Evidence map seeded with the canonical `path`.
pub fn with_path(path: &FieldPath) -> EvidenceMap {
    let mut evidence = EvidenceMap::new();
    evidence.insert("path".into(), json!(path.to_string()));
    evidence
}

pub fn insert_missing(evidence: &mut EvidenceMap, missing: &MissingField) {
    evidence.insert("missing_field".into(), json!(missing.missing_field));
    evidence.insert("resolved_prefix".into(), json!(missing.resolved_prefix));
}

/// Failed outcome for a path that did not resolve.
pub fn missing_outcome(mut evidence: EvidenceMap, missing: &MissingField) -> Outcome {
    insert_missing(&mut evidence, missing);
    let resolved = if missing.resolved_prefix.is_empty() {
        "<root>"
    } else {
        missing.resolved_prefix.as_str()
    };
    Outcome::fail(
        format!(
            "{}: '{}' not found (resolved up to {resolved})",
            ids::CODE_MISSING_FIELD,
            missing.missing_field
        ),
        evidence,
    )
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON equality where `1` and `1.0` compare equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Compact rendering for messages.
pub fn show(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}
