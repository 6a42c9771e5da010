use super::utils::{missing_outcome, type_name, with_path};
use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::{FieldPath, ids};
use serde_json::{Value, json};

/// Passes for a string, array, or table with at least one element.
pub fn run(path: &FieldPath, snapshot: &Snapshot) -> Outcome {
    let mut evidence = with_path(path);

    let actual = match snapshot.resolve(path) {
        Ok(actual) => actual,
        Err(missing) => return missing_outcome(evidence, &missing),
    };
    evidence.insert("actual_type".into(), json!(type_name(actual)));

    let len = match actual {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Outcome::fail(
                format!(
                    "{}: '{path}' is {}, expected a string, array, or table",
                    ids::CODE_TYPE_MISMATCH,
                    type_name(other)
                ),
                evidence,
            );
        }
    };
    evidence.insert("len".into(), json!(len));

    if len > 0 {
        Outcome::pass(format!("'{path}' has {len} element(s)"), evidence)
    } else {
        Outcome::fail(
            format!("{}: '{path}' is empty", ids::CODE_EMPTY_VALUE),
            evidence,
        )
    }
}
