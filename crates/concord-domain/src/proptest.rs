//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Collector determinism across schedules
//! - Agreement between the imperative and declarative layers on the same evidence
//! - The exit code law
//! - Evidence gaps surfacing as consistency violations

use crate::collector::{Parallelism, run_all_with};
use crate::consistency::{check, imperative_verdict};
use crate::exit::ExitDecision;
use crate::registry::Registry;
use crate::snapshot::Snapshot;
use crate::test_support::{contract, equals_rule};
use concord_contract::Contract;
use concord_types::{EvidenceReport, PolicyVerdict, Priority};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

// ============================================================================
// Strategies
// ============================================================================

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Must),
        Just(Priority::Should),
        Just(Priority::Have)
    ]
}

/// Per rule: priority and the snapshot state of its key (absent, true, false).
fn arb_rules() -> impl Strategy<Value = Vec<(Priority, Option<bool>)>> {
    prop::collection::vec((arb_priority(), prop::option::of(any::<bool>())), 1..20)
}

fn build(rules: &[(Priority, Option<bool>)]) -> (Contract, Snapshot) {
    let mut root = Map::new();
    let mut list = Vec::new();
    for (i, (priority, state)) in rules.iter().enumerate() {
        let key = format!("k{i}");
        if let Some(v) = state {
            root.insert(key.clone(), json!(v));
        }
        list.push(equals_rule(&format!("R{i:02}"), *priority, &key, json!(true)));
    }
    (contract(list), Snapshot::new(Value::Object(root)))
}

fn arb_ids() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[A-D][0-3]", 0..4)
}

fn arb_verdict() -> impl Strategy<Value = PolicyVerdict> {
    (arb_ids(), arb_ids(), arb_ids()).prop_map(|(deny, warn, info)| PolicyVerdict {
        deny,
        warn,
        info,
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn evidence_is_identical_across_schedules(rules in arb_rules()) {
        let (c, snap) = build(&rules);
        let registry = Registry::from_contract(&c).unwrap();

        let seq = run_all_with(&c, &registry, &snap, Parallelism::Sequential).unwrap();
        let par = run_all_with(&c, &registry, &snap, Parallelism::Threads(3)).unwrap();

        let a = EvidenceReport::from_results(&seq).to_json_bytes().unwrap();
        let b = EvidenceReport::from_results(&par).to_json_bytes().unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn both_layers_agree_on_the_same_evidence(rules in arb_rules()) {
        let (c, snap) = build(&rules);
        let registry = Registry::from_contract(&c).unwrap();
        let results = run_all_with(&c, &registry, &snap, Parallelism::Sequential).unwrap();

        let report = EvidenceReport::from_results(&results);
        let declarative = concord_policy::evaluate(c.rules(), &report);
        let outcome = check(&results, &declarative);
        prop_assert!(outcome.is_agreed());

        for (i, (priority, state)) in rules.iter().enumerate() {
            let id = format!("R{i:02}");
            let failed = *state != Some(true);
            let bucketed = declarative.bucket_of(&id);
            prop_assert_eq!(bucketed.is_some(), failed);
            if failed {
                prop_assert_eq!(bucketed, Some(concord_types::Bucket::for_priority(*priority)));
            }
        }
    }

    #[test]
    fn dropping_passing_evidence_is_detected(rules in arb_rules()) {
        let (c, snap) = build(&rules);
        let registry = Registry::from_contract(&c).unwrap();
        let results = run_all_with(&c, &registry, &snap, Parallelism::Sequential).unwrap();

        let Some(passing) = results.iter().find(|r| r.passed) else {
            return Ok(());
        };
        let gap = EvidenceReport::from_results(&results).without(&passing.rule_id);
        let declarative = concord_policy::evaluate(c.rules(), &gap);

        let violation = check(&results, &declarative).into_result().unwrap_err();
        prop_assert!(violation
            .drift
            .iter()
            .any(|d| d.only_right.contains(&passing.rule_id)));
    }

    #[test]
    fn exit_code_law_holds(v in arb_verdict()) {
        let code = ExitDecision::from_verdict(&v).code();
        let expected = if !v.deny.is_empty() {
            2
        } else if !v.warn.is_empty() {
            1
        } else {
            0
        };
        prop_assert_eq!(code, expected);
    }

    #[test]
    fn imperative_verdict_never_overlaps(rules in arb_rules()) {
        let (c, snap) = build(&rules);
        let registry = Registry::from_contract(&c).unwrap();
        let results = run_all_with(&c, &registry, &snap, Parallelism::Default).unwrap();
        prop_assert!(imperative_verdict(&results).overlapping().is_empty());
    }
}
