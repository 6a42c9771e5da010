//! Property tests for the declarative evaluator.

use crate::evaluate::evaluate;
use concord_types::{
    Bucket, EvidenceEntry, EvidenceReport, EvidenceSchema, Priority, Rule,
};
use proptest::prelude::*;
use serde_json::Map;

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Must),
        Just(Priority::Should),
        Just(Priority::Have)
    ]
}

/// Rules with unique IDs, each paired with its evidence state:
/// `None` = no report entry, `Some(ok)` = entry with that flag.
fn arb_case() -> impl Strategy<Value = Vec<(Rule, Option<bool>)>> {
    prop::collection::vec((arb_priority(), prop::option::of(any::<bool>())), 0..24).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (priority, state))| {
                    let rule = Rule {
                        rule_id: format!("R{i:03}"),
                        priority,
                        title: String::new(),
                        description: None,
                        evidence_schema: EvidenceSchema::default(),
                        check: None,
                    };
                    (rule, state)
                })
                .collect()
        },
    )
}

fn split(case: &[(Rule, Option<bool>)]) -> (Vec<Rule>, EvidenceReport) {
    let rules = case.iter().map(|(r, _)| r.clone()).collect();
    let report = case
        .iter()
        .filter_map(|(r, state)| {
            state.map(|ok| {
                (
                    r.rule_id.clone(),
                    EvidenceEntry {
                        ok,
                        evidence: Map::new(),
                        message: String::new(),
                    },
                )
            })
        })
        .collect();
    (rules, report)
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(case in arb_case()) {
        let (rules, report) = split(&case);
        let a = serde_json::to_vec(&evaluate(&rules, &report)).unwrap();
        let b = serde_json::to_vec(&evaluate(&rules, &report)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn every_rule_lands_where_its_priority_says(case in arb_case()) {
        let (rules, report) = split(&case);
        let verdict = evaluate(&rules, &report);

        prop_assert!(verdict.overlapping().is_empty());
        for (rule, state) in &case {
            let ok = state.unwrap_or(false);
            let expected = (!ok).then(|| Bucket::for_priority(rule.priority));
            prop_assert_eq!(verdict.bucket_of(&rule.rule_id), expected);
        }
        prop_assert_eq!(
            verdict.failed_count(),
            case.iter().filter(|(_, s)| *s != Some(true)).count()
        );
    }

    #[test]
    fn reordering_the_report_does_not_change_the_verdict(case in arb_case()) {
        let (rules, report) = split(&case);
        let reversed: EvidenceReport = report
            .entries()
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        prop_assert_eq!(evaluate(&rules, &report), evaluate(&rules, &reversed));
    }
}
