use super::utils::{missing_outcome, show, values_equal, with_path};
use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::{FieldPath, ids};
use serde_json::Value;

pub fn run(path: &FieldPath, expected: &Value, snapshot: &Snapshot) -> Outcome {
    let mut evidence = with_path(path);
    evidence.insert("expected".into(), expected.clone());

    let actual = match snapshot.resolve(path) {
        Ok(actual) => actual,
        Err(missing) => return missing_outcome(evidence, &missing),
    };
    evidence.insert("actual".into(), actual.clone());

    if values_equal(actual, expected) {
        Outcome::pass(format!("'{path}' equals {}", show(expected)), evidence)
    } else {
        Outcome::fail(
            format!(
                "{}: '{path}' is {}, expected {}",
                ids::CODE_VALUE_MISMATCH,
                show(actual),
                show(expected)
            ),
            evidence,
        )
    }
}
