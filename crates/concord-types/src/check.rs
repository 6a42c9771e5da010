//! Built-in check bindings a contract rule may declare instead of a custom validator.

use crate::ids;
use crate::path::FieldPath;
use crate::rule::{EvidenceSchema, FieldSpec, FieldType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A built-in validator bound to a rule by the contract.
///
/// Every kind resolves explicit field paths against the snapshot; a path that does not
/// resolve yields `missing_field` / `resolved_prefix` evidence rather than a bare `false`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum CheckSpec {
    Present {
        path: String,
    },
    Equals {
        path: String,
        value: Value,
    },
    OneOf {
        path: String,
        values: Vec<Value>,
    },
    Range {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Matches {
        path: String,
        pattern: String,
    },
    NonEmpty {
        path: String,
    },
    AllPresent {
        paths: Vec<String>,
    },
}

impl CheckSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            CheckSpec::Present { .. } => ids::CHECK_PRESENT,
            CheckSpec::Equals { .. } => ids::CHECK_EQUALS,
            CheckSpec::OneOf { .. } => ids::CHECK_ONE_OF,
            CheckSpec::Range { .. } => ids::CHECK_RANGE,
            CheckSpec::Matches { .. } => ids::CHECK_MATCHES,
            CheckSpec::NonEmpty { .. } => ids::CHECK_NON_EMPTY,
            CheckSpec::AllPresent { .. } => ids::CHECK_ALL_PRESENT,
        }
    }

    /// Every field path this check reads.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            CheckSpec::Present { path }
            | CheckSpec::Equals { path, .. }
            | CheckSpec::OneOf { path, .. }
            | CheckSpec::Range { path, .. }
            | CheckSpec::Matches { path, .. }
            | CheckSpec::NonEmpty { path } => vec![path.as_str()],
            CheckSpec::AllPresent { paths } => paths.iter().map(String::as_str).collect(),
        }
    }

    /// Structural problems that make the binding unusable (glob syntax is checked by the loader).
    pub fn shape_problem(&self) -> Option<String> {
        if self.paths().is_empty() {
            return Some("check must name at least one path".to_string());
        }
        if let Some(err) = self.paths().iter().find_map(|p| FieldPath::parse(p).err()) {
            return Some(err);
        }
        match self {
            CheckSpec::OneOf { values, .. } if values.is_empty() => {
                Some("one_of requires at least one allowed value".to_string())
            }
            CheckSpec::Range {
                min: None,
                max: None,
                ..
            } => Some("range requires min, max, or both".to_string()),
            CheckSpec::Range { min, max, .. }
                if min.iter().chain(max.iter()).any(|b| !b.is_finite()) =>
            {
                Some("range bounds must be finite numbers".to_string())
            }
            CheckSpec::Range {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => Some(format!("range min {min} is greater than max {max}")),
            CheckSpec::Matches { pattern, .. } if pattern.is_empty() => {
                Some("matches requires a non-empty pattern".to_string())
            }
            _ => None,
        }
    }

    /// The exact evidence shape the built-in validator emits.
    pub fn default_schema(&self) -> EvidenceSchema {
        use FieldType::*;

        let mut fields: Vec<(&str, FieldSpec)> = Vec::new();
        let missing = [
            ("missing_field", FieldSpec::optional(String)),
            ("resolved_prefix", FieldSpec::optional(String)),
        ];
        match self {
            CheckSpec::Present { .. } => {
                fields.push(("path", FieldSpec::required(String)));
                fields.push(("present", FieldSpec::required(Bool)));
                fields.extend(missing);
            }
            CheckSpec::Equals { .. } => {
                fields.push(("path", FieldSpec::required(String)));
                fields.push(("expected", FieldSpec::required(Any)));
                fields.push(("actual", FieldSpec::optional(Any)));
                fields.extend(missing);
            }
            CheckSpec::OneOf { .. } => {
                fields.push(("path", FieldSpec::required(String)));
                fields.push(("allowed", FieldSpec::required(Array)));
                fields.push(("actual", FieldSpec::optional(Any)));
                fields.extend(missing);
            }
            CheckSpec::Range { .. } => {
                fields.push(("path", FieldSpec::required(String)));
                fields.push(("min", FieldSpec::optional(Number)));
                fields.push(("max", FieldSpec::optional(Number)));
                fields.push(("actual", FieldSpec::optional(Any)));
                fields.extend(missing);
            }
            CheckSpec::Matches { .. } => {
                fields.push(("path", FieldSpec::required(String)));
                fields.push(("pattern", FieldSpec::required(String)));
                fields.push(("actual", FieldSpec::optional(Any)));
                fields.extend(missing);
            }
            CheckSpec::NonEmpty { .. } => {
                fields.push(("path", FieldSpec::required(String)));
                fields.push(("len", FieldSpec::optional(Integer)));
                fields.push(("actual_type", FieldSpec::optional(String)));
                fields.extend(missing);
            }
            CheckSpec::AllPresent { .. } => {
                fields.push(("paths", FieldSpec::required(Array)));
                fields.push(("missing", FieldSpec::required(Array)));
            }
        }
        fields
            .into_iter()
            .map(|(name, spec)| (name.to_string(), spec))
            .collect()
    }
}
