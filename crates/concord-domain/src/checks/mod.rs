//! Built-in validators bound by a rule's `check` table.

use crate::registry::{Outcome, Validator, ValidatorError};
use crate::snapshot::Snapshot;
use concord_types::{CheckSpec, FieldPath, Rule};
use globset::{Glob, GlobMatcher};
use serde_json::Value;

mod all_present;
mod equals;
mod matches;
mod non_empty;
mod one_of;
mod present;
mod range;
mod utils;

#[cfg(test)]
mod tests;

/// A `CheckSpec` with its paths parsed and its pattern compiled.
#[derive(Clone, Debug)]
pub enum BuiltinCheck {
    Present {
        path: FieldPath,
    },
    Equals {
        path: FieldPath,
        expected: Value,
    },
    OneOf {
        path: FieldPath,
        allowed: Vec<Value>,
    },
    Range {
        path: FieldPath,
        min: Option<f64>,
        max: Option<f64>,
    },
    Matches {
        path: FieldPath,
        pattern: String,
        matcher: GlobMatcher,
    },
    NonEmpty {
        path: FieldPath,
    },
    AllPresent {
        paths: Vec<FieldPath>,
    },
}

impl BuiltinCheck {
    pub fn compile(spec: &CheckSpec) -> Result<Self, String> {
        if let Some(problem) = spec.shape_problem() {
            return Err(problem);
        }
        Ok(match spec {
            CheckSpec::Present { path } => BuiltinCheck::Present {
                path: FieldPath::parse(path)?,
            },
            CheckSpec::Equals { path, value } => BuiltinCheck::Equals {
                path: FieldPath::parse(path)?,
                expected: value.clone(),
            },
            CheckSpec::OneOf { path, values } => BuiltinCheck::OneOf {
                path: FieldPath::parse(path)?,
                allowed: values.clone(),
            },
            CheckSpec::Range { path, min, max } => BuiltinCheck::Range {
                path: FieldPath::parse(path)?,
                min: *min,
                max: *max,
            },
            CheckSpec::Matches { path, pattern } => {
                let glob = Glob::new(pattern)
                    .map_err(|e| format!("invalid glob pattern {pattern}: {e}"))?;
                BuiltinCheck::Matches {
                    path: FieldPath::parse(path)?,
                    pattern: pattern.clone(),
                    matcher: glob.compile_matcher(),
                }
            }
            CheckSpec::NonEmpty { path } => BuiltinCheck::NonEmpty {
                path: FieldPath::parse(path)?,
            },
            CheckSpec::AllPresent { paths } => BuiltinCheck::AllPresent {
                paths: paths
                    .iter()
                    .map(|p| FieldPath::parse(p))
                    .collect::<Result<_, _>>()?,
            },
        })
    }
}

impl Validator for BuiltinCheck {
    fn validate(&self, _rule: &Rule, snapshot: &Snapshot) -> Result<Outcome, ValidatorError> {
        Ok(match self {
            BuiltinCheck::Present { path } => present::run(path, snapshot),
            BuiltinCheck::Equals { path, expected } => equals::run(path, expected, snapshot),
            BuiltinCheck::OneOf { path, allowed } => one_of::run(path, allowed, snapshot),
            BuiltinCheck::Range { path, min, max } => range::run(path, *min, *max, snapshot),
            BuiltinCheck::Matches {
                path,
                pattern,
                matcher,
            } => matches::run(path, pattern, matcher, snapshot),
            BuiltinCheck::NonEmpty { path } => non_empty::run(path, snapshot),
            BuiltinCheck::AllPresent { paths } => all_present::run(paths, snapshot),
        })
    }
}
