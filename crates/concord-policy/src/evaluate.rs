use crate::input::PolicyInput;
use concord_types::{EvidenceReport, PolicyVerdict, Priority, Rule};

/// Bucket every contract rule by priority using only the evidence report.
///
/// A rule with no report entry is treated as failed. Report entries for rules outside
/// `rules` are ignored.
pub fn evaluate(rules: &[Rule], report: &EvidenceReport) -> PolicyVerdict {
    bucket(
        rules.iter().map(|r| (r.rule_id.as_str(), r.priority)),
        report,
    )
}

pub fn evaluate_input(input: &PolicyInput) -> PolicyVerdict {
    bucket(
        input.rules.iter().map(|r| (r.rule_id.as_str(), r.priority)),
        &input.evidence,
    )
}

fn bucket<'a>(
    rules: impl Iterator<Item = (&'a str, Priority)>,
    report: &EvidenceReport,
) -> PolicyVerdict {
    let mut verdict = PolicyVerdict::default();
    let mut gaps = 0usize;
    for (rule_id, priority) in rules {
        let ok = match report.get(rule_id) {
            Some(entry) => entry.ok,
            None => {
                gaps += 1;
                log::warn!("no evidence for rule {rule_id}; treating it as failed");
                false
            }
        };
        verdict.record(rule_id, priority, ok);
    }
    log::debug!(
        "declarative verdict: {} deny, {} warn, {} info ({gaps} evidence gaps)",
        verdict.deny.len(),
        verdict.warn.len(),
        verdict.info.len()
    );
    verdict
}
