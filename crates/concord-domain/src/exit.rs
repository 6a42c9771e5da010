use crate::consistency::AgreedVerdict;
use concord_types::{ExitSummary, PolicyVerdict};

/// Process outcome for a run whose layers agreed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExitDecision {
    Pass,
    SoftFail,
    HardFail,
}

impl ExitDecision {
    /// deny wins over warn; info never fails a run.
    pub fn from_verdict(verdict: &PolicyVerdict) -> Self {
        if !verdict.deny.is_empty() {
            ExitDecision::HardFail
        } else if !verdict.warn.is_empty() {
            ExitDecision::SoftFail
        } else {
            ExitDecision::Pass
        }
    }

    pub fn for_agreed(verdict: &AgreedVerdict) -> Self {
        Self::from_verdict(verdict.verdict())
    }

    pub fn code(self) -> i32 {
        match self {
            ExitDecision::Pass => 0,
            ExitDecision::SoftFail => 1,
            ExitDecision::HardFail => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExitDecision::Pass => "pass",
            ExitDecision::SoftFail => "soft_fail",
            ExitDecision::HardFail => "hard_fail",
        }
    }

    pub fn summary(self) -> ExitSummary {
        ExitSummary {
            code: self.code(),
            decision: self.as_str().to_string(),
        }
    }
}

/// Runs that end without a verdict. Codes never overlap with `ExitDecision`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatalExit {
    /// Contract, configuration, settings, or I/O problem.
    EngineFault,
    /// Layers disagreed, or the audit chain failed verification.
    TrustFault,
}

impl FatalExit {
    pub fn code(self) -> i32 {
        match self {
            FatalExit::EngineFault => 3,
            FatalExit::TrustFault => 4,
        }
    }
}

/// One exit decision per run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExitState {
    #[default]
    Evaluating,
    Decided(ExitDecision),
}

impl ExitState {
    /// Decide from an agreed verdict. A run that already decided keeps its first decision.
    pub fn decide(&mut self, verdict: &AgreedVerdict) -> ExitDecision {
        match *self {
            ExitState::Decided(decision) => decision,
            ExitState::Evaluating => {
                let decision = ExitDecision::for_agreed(verdict);
                *self = ExitState::Decided(decision);
                decision
            }
        }
    }

    pub fn decision(&self) -> Option<ExitDecision> {
        match self {
            ExitState::Evaluating => None,
            ExitState::Decided(d) => Some(*d),
        }
    }
}
