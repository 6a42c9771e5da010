//! Explain registry for built-in check kinds and codes.
//!
//! Rule-level explanations come from the loaded contract; this registry covers the
//! identifiers concord itself defines.

use crate::ids;

/// Explanation entry for a check kind or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the check kind/code.
    pub title: &'static str,
    /// What it does and when it appears.
    pub description: &'static str,
    /// How to act on it.
    pub remediation: &'static str,
    /// Before/after contract or snapshot examples.
    pub examples: ExamplePair,
}

/// Before and after examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    pub before: &'static str,
    pub after: &'static str,
}

/// Look up an explanation by check kind or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Check kinds
        ids::CHECK_PRESENT => Some(explain_present()),
        ids::CHECK_EQUALS => Some(explain_equals()),
        ids::CHECK_ONE_OF => Some(explain_one_of()),
        ids::CHECK_RANGE => Some(explain_range()),
        ids::CHECK_MATCHES => Some(explain_matches()),
        ids::CHECK_NON_EMPTY => Some(explain_non_empty()),
        ids::CHECK_ALL_PRESENT => Some(explain_all_present()),

        // Codes
        ids::CODE_MISSING_FIELD => Some(explain_missing_field()),
        ids::CODE_TYPE_MISMATCH => Some(explain_type_mismatch()),
        ids::CODE_VALUE_MISMATCH => Some(explain_value_mismatch()),
        ids::CODE_OUT_OF_RANGE => Some(explain_out_of_range()),
        ids::CODE_EMPTY_VALUE => Some(explain_empty_value()),
        ids::CODE_ENGINE_ERROR | ids::ENGINE_ERROR => Some(explain_engine_error()),

        _ => None,
    }
}

/// List all built-in check kinds.
pub fn all_check_kinds() -> &'static [&'static str] {
    &[
        ids::CHECK_PRESENT,
        ids::CHECK_EQUALS,
        ids::CHECK_ONE_OF,
        ids::CHECK_RANGE,
        ids::CHECK_MATCHES,
        ids::CHECK_NON_EMPTY,
        ids::CHECK_ALL_PRESENT,
    ]
}

/// List all explained codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_MISSING_FIELD,
        ids::CODE_TYPE_MISMATCH,
        ids::CODE_VALUE_MISMATCH,
        ids::CODE_OUT_OF_RANGE,
        ids::CODE_EMPTY_VALUE,
        ids::CODE_ENGINE_ERROR,
    ]
}

// --- Check kinds ---

fn explain_present() -> Explanation {
    Explanation {
        title: "Field Present",
        description: "\
Passes when the field at `path` resolves in the input snapshot and is not null.

When the path does not resolve, the evidence names the first missing segment
(`missing_field`) and the deepest prefix that did resolve (`resolved_prefix`).",
        remediation: "\
Add the field to the input snapshot, or correct the `path` in the contract if the
snapshot layout changed.",
        examples: ExamplePair {
            before: r#"[[rules]]
rule_id = "SEC-001"
priority = "must"
title = "TLS configuration is declared"
check = { kind = "present", path = "security.tls" }

# snapshot: { "security": {} }"#,
            after: r#"# snapshot: { "security": { "tls": { "enabled": true } } }"#,
        },
    }
}

fn explain_equals() -> Explanation {
    Explanation {
        title: "Field Equals",
        description: "\
Passes when the field at `path` equals `value`. Numbers compare by value (`1` and
`1.0` are equal); strings are case-sensitive.",
        remediation: "\
Set the snapshot field to the expected value, or relax the rule to `one_of` if
several values are acceptable.",
        examples: ExamplePair {
            before: r#"check = { kind = "equals", path = "security.tls.enabled", value = true }

# snapshot: { "security": { "tls": { "enabled": false } } }"#,
            after: r#"# snapshot: { "security": { "tls": { "enabled": true } } }"#,
        },
    }
}

fn explain_one_of() -> Explanation {
    Explanation {
        title: "Field One Of",
        description: "Passes when the field at `path` equals one of the listed `values`.",
        remediation: "Use one of the allowed values, or extend the allowed list in the contract.",
        examples: ExamplePair {
            before: r#"check = { kind = "one_of", path = "data.region", values = ["eu-west-1", "eu-central-1"] }

# snapshot: { "data": { "region": "us-east-1" } }"#,
            after: r#"# snapshot: { "data": { "region": "eu-west-1" } }"#,
        },
    }
}

fn explain_range() -> Explanation {
    Explanation {
        title: "Numeric Range",
        description: "\
Passes when the field at `path` is a number within `[min, max]` (both inclusive,
either may be omitted). Non-numeric values fail with the value echoed as `actual`.",
        remediation: "Bring the value within bounds, or revisit the bounds in the contract.",
        examples: ExamplePair {
            before: r#"check = { kind = "range", path = "retention.days", min = 30 }

# snapshot: { "retention": { "days": 7 } }"#,
            after: r#"# snapshot: { "retention": { "days": 90 } }"#,
        },
    }
}

fn explain_matches() -> Explanation {
    Explanation {
        title: "String Matches Glob",
        description: "\
Passes when the field at `path` is a string matching the glob `pattern`
(case-sensitive, `*` and `?` wildcards, `{a,b}` alternatives).",
        remediation: "Change the value so it matches, or adjust the pattern.",
        examples: ExamplePair {
            before: r#"check = { kind = "matches", path = "owner.email", pattern = "*@example.com" }

# snapshot: { "owner": { "email": "someone@gmail.com" } }"#,
            after: r#"# snapshot: { "owner": { "email": "team@example.com" } }"#,
        },
    }
}

fn explain_non_empty() -> Explanation {
    Explanation {
        title: "Field Non-Empty",
        description: "\
Passes when the field at `path` is a non-empty string, array, or object. Other
types fail with their type name reported as `actual_type`.",
        remediation: "Populate the field in the snapshot.",
        examples: ExamplePair {
            before: r#"check = { kind = "non_empty", path = "incident.contacts" }

# snapshot: { "incident": { "contacts": [] } }"#,
            after: r#"# snapshot: { "incident": { "contacts": ["oncall@example.com"] } }"#,
        },
    }
}

fn explain_all_present() -> Explanation {
    Explanation {
        title: "All Fields Present",
        description: "\
Passes when every path in `paths` resolves to a non-null value. The evidence lists
every path that did not resolve under `missing`.",
        remediation: "Add each missing field to the snapshot.",
        examples: ExamplePair {
            before: r#"check = { kind = "all_present", paths = ["dpo.name", "dpo.email"] }

# snapshot: { "dpo": { "name": "A. Person" } }"#,
            after: r#"# snapshot: { "dpo": { "name": "A. Person", "email": "dpo@example.com" } }"#,
        },
    }
}

// --- Codes ---

fn explain_missing_field() -> Explanation {
    Explanation {
        title: "Missing Field",
        description: "\
A check path did not resolve against the snapshot. Evidence carries the first
segment that was absent (`missing_field`) and the prefix that did resolve.",
        remediation: "Add the field or fix the path. A missing field is always a failure.",
        examples: ExamplePair {
            before: r#"{ "ok": false, "evidence": { "path": "a.b.c", "present": false, "missing_field": "a.b", "resolved_prefix": "a" } }"#,
            after: r#"{ "ok": true, "evidence": { "path": "a.b.c", "present": true } }"#,
        },
    }
}

fn explain_type_mismatch() -> Explanation {
    Explanation {
        title: "Type Mismatch",
        description: "\
The field resolved, but holds a type the check cannot evaluate: a non-number for
`range`, a non-string for `matches`, or a scalar for `non_empty`.",
        remediation: "Store the value with the expected type in the snapshot.",
        examples: ExamplePair {
            before: r#"# range on retention.days, snapshot: { "retention": { "days": "90" } }"#,
            after: r#"# snapshot: { "retention": { "days": 90 } }"#,
        },
    }
}

fn explain_value_mismatch() -> Explanation {
    Explanation {
        title: "Value Mismatch",
        description: "\
The field resolved to a value the rule does not accept (`equals`, `one_of`, or a
`matches` pattern that did not match). Evidence echoes the value as `actual`.",
        remediation: "Change the snapshot value, or widen what the rule accepts.",
        examples: ExamplePair {
            before: r#"{ "ok": false, "evidence": { "path": "env", "expected": "prod", "actual": "dev" } }"#,
            after: r#"{ "ok": true, "evidence": { "path": "env", "expected": "prod", "actual": "prod" } }"#,
        },
    }
}

fn explain_out_of_range() -> Explanation {
    Explanation {
        title: "Out Of Range",
        description: "A numeric field is below `min` or above `max`.",
        remediation: "Bring the value within bounds.",
        examples: ExamplePair {
            before: r#"{ "ok": false, "evidence": { "path": "retention.days", "min": 30.0, "actual": 7 } }"#,
            after: r#"{ "ok": true, "evidence": { "path": "retention.days", "min": 30.0, "actual": 90 } }"#,
        },
    }
}

fn explain_empty_value() -> Explanation {
    Explanation {
        title: "Empty Value",
        description: "A `non_empty` field resolved to an empty string, array, or object.",
        remediation: "Populate the field.",
        examples: ExamplePair {
            before: r#"{ "ok": false, "evidence": { "path": "owners", "len": 0, "actual_type": "array" } }"#,
            after: r#"{ "ok": true, "evidence": { "path": "owners", "len": 2, "actual_type": "array" } }"#,
        },
    }
}

fn explain_engine_error() -> Explanation {
    Explanation {
        title: "Engine Error",
        description: "\
The validator for this rule panicked, returned an error, or produced evidence that
does not conform to the rule's evidence schema. The rule is counted as failed and
the run continues; the message is prefixed with `ENGINE_ERROR` so the fault is not
mistaken for a business-rule failure.",
        remediation: "\
Fix the validator (see `evidence.error` for the cause) or align the rule's evidence
schema with what the validator emits.",
        examples: ExamplePair {
            before: r#"{ "ok": false, "evidence": { "error": "validator panicked: index out of bounds" }, "message": "ENGINE_ERROR: validator panicked: index out of bounds" }"#,
            after: r#"{ "ok": true, "evidence": { "path": "a", "present": true }, "message": "field 'a' is present" }"#,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_identifier_is_explained() {
        for id in all_check_kinds().iter().chain(all_codes()) {
            let exp = lookup_explanation(id).unwrap_or_else(|| panic!("no explanation for {id}"));
            assert!(!exp.title.is_empty());
            assert!(!exp.remediation.is_empty());
        }
    }

    #[test]
    fn engine_error_marker_is_an_alias() {
        assert!(lookup_explanation(ids::ENGINE_ERROR).is_some());
        assert!(lookup_explanation("no_such_thing").is_none());
    }
}
