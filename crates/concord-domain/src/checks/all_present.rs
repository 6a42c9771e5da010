use crate::registry::Outcome;
use crate::snapshot::Snapshot;
use concord_types::{EvidenceMap, FieldPath, ids};
use serde_json::{Value, json};

pub fn run(paths: &[FieldPath], snapshot: &Snapshot) -> Outcome {
    let missing: Vec<String> = paths
        .iter()
        .filter(|p| matches!(snapshot.resolve(p), Err(_) | Ok(Value::Null)))
        .map(|p| p.to_string())
        .collect();

    let mut evidence = EvidenceMap::new();
    evidence.insert(
        "paths".into(),
        json!(paths.iter().map(|p| p.to_string()).collect::<Vec<_>>()),
    );
    evidence.insert("missing".into(), json!(missing));

    if missing.is_empty() {
        Outcome::pass(format!("all {} path(s) present", paths.len()), evidence)
    } else {
        Outcome::fail(
            format!(
                "{}: {} of {} path(s) absent: {}",
                ids::CODE_MISSING_FIELD,
                missing.len(),
                paths.len(),
                missing.join(", ")
            ),
            evidence,
        )
    }
}
