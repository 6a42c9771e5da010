use super::utils::{missing_outcome, show, values_equal, with_path};
use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::{FieldPath, ids};
use serde_json::Value;

pub fn run(path: &FieldPath, allowed: &[Value], snapshot: &Snapshot) -> Outcome {
    let mut evidence = with_path(path);
    evidence.insert("allowed".into(), Value::Array(allowed.to_vec()));

    let actual = match snapshot.resolve(path) {
        Ok(actual) => actual,
        Err(missing) => return missing_outcome(evidence, &missing),
    };
    evidence.insert("actual".into(), actual.clone());

    if allowed.iter().any(|v| values_equal(v, actual)) {
        Outcome::pass(format!("'{path}' is an allowed value"), evidence)
    } else {
        Outcome::fail(
            format!(
                "{}: '{path}' is {}, not one of {}",
                ids::CODE_VALUE_MISMATCH,
                show(actual),
                Value::Array(allowed.to_vec())
            ),
            evidence,
        )
    }
}
