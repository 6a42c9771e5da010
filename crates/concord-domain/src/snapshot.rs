use concord_types::{FieldPath, Segment};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid json: {0}")]
    Json(String),
    #[error("snapshot is not valid toml: {0}")]
    Toml(String),
}

/// Immutable input snapshot shared read-only by every validator of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    root: Arc<Value>,
}

/// A path that did not resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingField {
    /// Path up to and including the first absent segment.
    pub missing_field: String,
    /// Deepest prefix that did resolve (empty for the root).
    pub resolved_prefix: String,
}

impl Snapshot {
    pub fn new(root: Value) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, SnapshotError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SnapshotError::Json(e.to_string()))?;
        Ok(Self::new(value))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SnapshotError> {
        let value: Value = toml::from_str(text).map_err(|e| SnapshotError::Toml(e.to_string()))?;
        Ok(Self::new(value))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Walk `path` from the root. A numeric key also indexes into arrays.
    pub fn resolve(&self, path: &FieldPath) -> Result<&Value, MissingField> {
        let mut cur: &Value = &self.root;
        for (i, seg) in path.segments().iter().enumerate() {
            let next = match (seg, cur) {
                (Segment::Key(k), Value::Object(map)) => map.get(k),
                (Segment::Key(k), Value::Array(items)) => {
                    k.parse::<usize>().ok().and_then(|idx| items.get(idx))
                }
                (Segment::Index(idx), Value::Array(items)) => items.get(*idx),
                _ => None,
            };
            match next {
                Some(v) => cur = v,
                None => {
                    return Err(MissingField {
                        missing_field: path.prefix(i + 1),
                        resolved_prefix: path.prefix(i),
                    });
                }
            }
        }
        Ok(cur)
    }
}
