use concord_types::{Bucket, PolicyVerdict, ValidationResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Which evaluation layer produced a verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Imperative,
    Declarative,
    External,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layer::Imperative => "imperative",
            Layer::Declarative => "declarative",
            Layer::External => "external",
        })
    }
}

/// Bucket the imperative results on their own: every failed result lands in the bucket of
/// its priority.
pub fn imperative_verdict(results: &[ValidationResult]) -> PolicyVerdict {
    let mut verdict = PolicyVerdict::default();
    for r in results {
        verdict.record(&r.rule_id, r.priority, r.passed);
    }
    verdict
}

/// One bucket where two layers disagree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketDrift {
    pub bucket: Bucket,
    /// Failed according to the left layer only.
    pub only_left: BTreeSet<String>,
    /// Failed according to the right layer only.
    pub only_right: BTreeSet<String>,
}

/// Two layers produced different verdicts. The run must not be recorded or trusted.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("CRITICAL: {left} and {right} verdicts disagree: {}", describe(.drift))]
pub struct ConsistencyViolation {
    pub left: Layer,
    pub right: Layer,
    pub drift: Vec<BucketDrift>,
}

fn describe(drift: &[BucketDrift]) -> String {
    drift
        .iter()
        .map(|d| {
            let list = |ids: &BTreeSet<String>| ids.iter().cloned().collect::<Vec<_>>().join(",");
            format!(
                "{} [only left: {}] [only right: {}]",
                d.bucket.as_str(),
                list(&d.only_left),
                list(&d.only_right)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A verdict both layers agreed on. Only obtainable through `check` or `compare`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgreedVerdict(PolicyVerdict);

impl AgreedVerdict {
    pub fn verdict(&self) -> &PolicyVerdict {
        &self.0
    }

    pub fn into_inner(self) -> PolicyVerdict {
        self.0
    }

    /// Cross-check against one more layer.
    pub fn confirm(
        self,
        layer: Layer,
        other: &PolicyVerdict,
    ) -> Result<AgreedVerdict, ConsistencyViolation> {
        compare(Layer::Declarative, &self.0, layer, other).into_result()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyOutcome {
    Agreed(AgreedVerdict),
    Diverged(ConsistencyViolation),
}

impl ConsistencyOutcome {
    pub fn into_result(self) -> Result<AgreedVerdict, ConsistencyViolation> {
        match self {
            ConsistencyOutcome::Agreed(v) => Ok(v),
            ConsistencyOutcome::Diverged(e) => Err(e),
        }
    }

    pub fn is_agreed(&self) -> bool {
        matches!(self, ConsistencyOutcome::Agreed(_))
    }
}

/// Compare the imperative results against the declarative verdict.
///
/// Equality is exact per bucket. Any difference, including a rule that the declarative
/// layer could not see, is a violation.
pub fn check(results: &[ValidationResult], declarative: &PolicyVerdict) -> ConsistencyOutcome {
    compare(
        Layer::Imperative,
        &imperative_verdict(results),
        Layer::Declarative,
        declarative,
    )
}

pub fn compare(
    left_layer: Layer,
    left: &PolicyVerdict,
    right_layer: Layer,
    right: &PolicyVerdict,
) -> ConsistencyOutcome {
    let drift: Vec<BucketDrift> = Bucket::ALL
        .into_iter()
        .filter_map(|bucket| {
            let (l, r) = (left.bucket(bucket), right.bucket(bucket));
            if l == r {
                return None;
            }
            Some(BucketDrift {
                bucket,
                only_left: l.difference(r).cloned().collect(),
                only_right: r.difference(l).cloned().collect(),
            })
        })
        .collect();

    if drift.is_empty() {
        ConsistencyOutcome::Agreed(AgreedVerdict(left.clone()))
    } else {
        let violation = ConsistencyViolation {
            left: left_layer,
            right: right_layer,
            drift,
        };
        log::error!("{violation}");
        ConsistencyOutcome::Diverged(violation)
    }
}

#[cfg(test)]
pub(crate) fn agreed_for_tests(verdict: PolicyVerdict) -> AgreedVerdict {
    AgreedVerdict(verdict)
}
