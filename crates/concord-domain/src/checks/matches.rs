use super::utils::{missing_outcome, type_name, with_path};
use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::{FieldPath, ids};
use globset::GlobMatcher;
use serde_json::json;

/// Glob match against a string value (case-sensitive).
pub fn run(path: &FieldPath, pattern: &str, matcher: &GlobMatcher, snapshot: &Snapshot) -> Outcome {
    let mut evidence = with_path(path);
    evidence.insert("pattern".into(), json!(pattern));

    let actual = match snapshot.resolve(path) {
        Ok(actual) => actual,
        Err(missing) => return missing_outcome(evidence, &missing),
    };
    evidence.insert("actual".into(), actual.clone());

    let Some(text) = actual.as_str() else {
        return Outcome::fail(
            format!(
                "{}: '{path}' is {}, expected a string",
                ids::CODE_TYPE_MISMATCH,
                type_name(actual)
            ),
            evidence,
        );
    };

    if matcher.is_match(text) {
        Outcome::pass(format!("'{path}' matches {pattern}"), evidence)
    } else {
        Outcome::fail(
            format!(
                "{}: '{path}' is '{text}', which does not match {pattern}",
                ids::CODE_VALUE_MISMATCH
            ),
            evidence,
        )
    }
}
