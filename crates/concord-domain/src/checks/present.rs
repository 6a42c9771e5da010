use super::utils::{missing_outcome, with_path};
use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::FieldPath;
use serde_json::{Value, json};

/// Passes when `path` resolves to a non-null value.
pub fn run(path: &FieldPath, snapshot: &Snapshot) -> Outcome {
    let mut evidence = with_path(path);
    match snapshot.resolve(path) {
        Ok(Value::Null) => {
            evidence.insert("present".into(), json!(false));
            Outcome::fail(format!("'{path}' is null"), evidence)
        }
        Ok(_) => {
            evidence.insert("present".into(), json!(true));
            Outcome::pass(format!("'{path}' is present"), evidence)
        }
        Err(missing) => {
            evidence.insert("present".into(), json!(false));
            missing_outcome(evidence, &missing)
        }
    }
}
