use super::{BuiltinCheck, utils};
use crate::registry::{Outcome, Validator};
use crate::test_support::{check_rule, snapshot};
use concord_types::{CheckSpec, Priority};
use serde_json::{Value, json};

fn run(spec: CheckSpec, input: Value) -> Outcome {
    let rule = check_rule("R", Priority::Must, spec.clone());
    let check = BuiltinCheck::compile(&spec).expect("compile");
    let outcome = check
        .validate(&rule, &snapshot(input))
        .expect("built-in checks never error");
    rule.evidence_schema
        .conform(&outcome.evidence)
        .expect("built-in evidence matches its default schema");
    outcome
}

#[test]
fn present_distinguishes_missing_null_and_set() {
    let spec = CheckSpec::Present {
        path: "tls.cert".into(),
    };

    let ok = run(spec.clone(), json!({"tls": {"cert": "pem"}}));
    assert!(ok.passed);
    assert_eq!(ok.evidence["present"], true);

    let null = run(spec.clone(), json!({"tls": {"cert": null}}));
    assert!(!null.passed);
    assert!(null.evidence.get("missing_field").is_none());

    let missing = run(spec, json!({"tls": {}}));
    assert!(!missing.passed);
    assert_eq!(missing.evidence["missing_field"], "tls.cert");
    assert_eq!(missing.evidence["resolved_prefix"], "tls");
    assert!(missing.message.starts_with("missing_field"));
}

#[test]
fn equals_treats_integer_and_float_alike() {
    let spec = CheckSpec::Equals {
        path: "replicas".into(),
        value: json!(3),
    };
    assert!(run(spec.clone(), json!({"replicas": 3.0})).passed);

    let wrong = run(spec, json!({"replicas": 2}));
    assert!(!wrong.passed);
    assert_eq!(wrong.evidence["actual"], 2);
    assert_eq!(wrong.evidence["expected"], 3);
}

#[test]
fn equals_missing_path_has_no_actual() {
    let out = run(
        CheckSpec::Equals {
            path: "a.b".into(),
            value: json!(true),
        },
        json!({}),
    );
    assert!(!out.passed);
    assert!(out.evidence.get("actual").is_none());
    assert_eq!(out.evidence["missing_field"], "a");
    assert_eq!(out.evidence["resolved_prefix"], "");
}

#[test]
fn one_of_checks_membership() {
    let spec = CheckSpec::OneOf {
        path: "env".into(),
        values: vec![json!("prod"), json!("staging")],
    };
    assert!(run(spec.clone(), json!({"env": "prod"})).passed);
    let out = run(spec, json!({"env": "dev"}));
    assert!(!out.passed);
    assert_eq!(out.evidence["allowed"], json!(["prod", "staging"]));
}

#[test]
fn range_is_inclusive_and_rejects_non_numbers() {
    let spec = CheckSpec::Range {
        path: "tls.min_version".into(),
        min: Some(1.2),
        max: Some(1.3),
    };
    assert!(run(spec.clone(), json!({"tls": {"min_version": 1.2}})).passed);
    assert!(run(spec.clone(), json!({"tls": {"min_version": 1.3}})).passed);

    let low = run(spec.clone(), json!({"tls": {"min_version": 1.0}}));
    assert!(!low.passed);
    assert!(low.message.starts_with("out_of_range"));

    let text = run(spec, json!({"tls": {"min_version": "1.2"}}));
    assert!(!text.passed);
    assert!(text.message.starts_with("type_mismatch"));
}

#[test]
fn range_with_open_upper_bound() {
    let spec = CheckSpec::Range {
        path: "n".into(),
        min: Some(0.0),
        max: None,
    };
    let out = run(spec, json!({"n": 1_000_000}));
    assert!(out.passed);
    assert!(out.evidence.get("max").is_none());
}

#[test]
fn matches_uses_glob_semantics() {
    let spec = CheckSpec::Matches {
        path: "image".into(),
        pattern: "registry.internal/*".into(),
    };
    assert!(run(spec.clone(), json!({"image": "registry.internal/app"})).passed);
    assert!(!run(spec.clone(), json!({"image": "docker.io/app"})).passed);
    assert!(!run(spec, json!({"image": 7})).passed);
}

#[test]
fn non_empty_counts_elements() {
    let spec = CheckSpec::NonEmpty {
        path: "owners".into(),
    };
    let ok = run(spec.clone(), json!({"owners": ["a"]}));
    assert!(ok.passed);
    assert_eq!(ok.evidence["len"], 1);
    assert_eq!(ok.evidence["actual_type"], "array");

    let empty = run(spec.clone(), json!({"owners": ""}));
    assert!(!empty.passed);
    assert!(empty.message.starts_with("empty_value"));

    let number = run(spec, json!({"owners": 3}));
    assert!(!number.passed);
    assert!(number.evidence.get("len").is_none());
}

#[test]
fn all_present_lists_every_absent_path() {
    let spec = CheckSpec::AllPresent {
        paths: vec!["a".into(), "b.c".into(), "d".into()],
    };
    let out = run(spec, json!({"a": 1, "b": {}, "d": null}));
    assert!(!out.passed);
    assert_eq!(out.evidence["missing"], json!(["b.c", "d"]));
    assert_eq!(out.evidence["paths"], json!(["a", "b.c", "d"]));
}

#[test]
fn compile_rejects_bad_shapes() {
    assert!(
        BuiltinCheck::compile(&CheckSpec::Matches {
            path: "a".into(),
            pattern: "[".into(),
        })
        .is_err()
    );
    assert!(
        BuiltinCheck::compile(&CheckSpec::Present {
            path: "a..b".into(),
        })
        .is_err()
    );
}

#[test]
fn type_names_split_integer_and_number() {
    assert_eq!(utils::type_name(&json!(1)), "integer");
    assert_eq!(utils::type_name(&json!(1.5)), "number");
    assert_eq!(utils::type_name(&json!(null)), "null");
    assert!(utils::values_equal(&json!({"a": [1]}), &json!({"a": [1.0]})));
}

#[test]
fn every_explained_code_is_produced_by_some_check() {
    let failures = [
        run(CheckSpec::Present { path: "a".into() }, json!({})),
        run(
            CheckSpec::Equals {
                path: "a".into(),
                value: json!(1),
            },
            json!({"a": 2}),
        ),
        run(
            CheckSpec::Range {
                path: "a".into(),
                min: Some(0.0),
                max: Some(1.0),
            },
            json!({"a": 5}),
        ),
        run(
            CheckSpec::Range {
                path: "a".into(),
                min: None,
                max: Some(1.0),
            },
            json!({"a": "x"}),
        ),
        run(CheckSpec::NonEmpty { path: "a".into() }, json!({"a": []})),
    ];
    let messages: Vec<&str> = failures.iter().map(|o| o.message.as_str()).collect();

    for code in concord_types::explain::all_codes() {
        // Produced by the collector for validator faults, not by a check.
        if *code == concord_types::ids::CODE_ENGINE_ERROR {
            continue;
        }
        assert!(
            messages.iter().any(|m| m.starts_with(code)),
            "no check emits {code}: {messages:?}"
        );
    }
}
