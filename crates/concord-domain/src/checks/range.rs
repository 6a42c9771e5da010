use super::utils::{missing_outcome, show, type_name, with_path};
use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::{FieldPath, ids};
use serde_json::json;

/// Inclusive bounds; either side may be open.
pub fn run(path: &FieldPath, min: Option<f64>, max: Option<f64>, snapshot: &Snapshot) -> Outcome {
    let mut evidence = with_path(path);
    if let Some(min) = min {
        evidence.insert("min".into(), json!(min));
    }
    if let Some(max) = max {
        evidence.insert("max".into(), json!(max));
    }

    let actual = match snapshot.resolve(path) {
        Ok(actual) => actual,
        Err(missing) => return missing_outcome(evidence, &missing),
    };
    evidence.insert("actual".into(), actual.clone());

    let Some(n) = actual.as_f64() else {
        return Outcome::fail(
            format!(
                "{}: '{path}' is {}, expected a number",
                ids::CODE_TYPE_MISMATCH,
                type_name(actual)
            ),
            evidence,
        );
    };

    let below = min.is_some_and(|min| n < min);
    let above = max.is_some_and(|max| n > max);
    if below || above {
        Outcome::fail(
            format!(
                "{}: '{path}' is {} outside {}",
                ids::CODE_OUT_OF_RANGE,
                show(actual),
                bounds(min, max)
            ),
            evidence,
        )
    } else {
        Outcome::pass(format!("'{path}' is within {}", bounds(min, max)), evidence)
    }
}

fn bounds(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("[{min}, {max}]"),
        (Some(min), None) => format!(">= {min}"),
        (None, Some(max)) => format!("<= {max}"),
        (None, None) => "any value".to_string(),
    }
}
