use crate::registry::{ConfigurationError, Outcome, Registry, Validator, ValidatorError};
use crate::snapshot::Snapshot;
use concord_contract::Contract;
use concord_types::{Rule, ValidationResult};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// How validators are scheduled. Results are always returned in contract order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// Rayon's global pool.
    #[default]
    Default,
    Sequential,
    /// Dedicated pool with this many threads (0 is treated as 1).
    Threads(usize),
}

pub fn run_all(
    contract: &Contract,
    registry: &Registry,
    snapshot: &Snapshot,
) -> Result<Vec<ValidationResult>, ConfigurationError> {
    run_all_with(contract, registry, snapshot, Parallelism::Default)
}

/// Run one validator per contract rule.
///
/// Fails before running anything if a rule has no validator. After that no validator
/// fault aborts the batch: panics, errors, and schema breaks become `ENGINE_ERROR` results.
pub fn run_all_with(
    contract: &Contract,
    registry: &Registry,
    snapshot: &Snapshot,
    parallelism: Parallelism,
) -> Result<Vec<ValidationResult>, ConfigurationError> {
    let bound = registry.bind(contract)?;
    let eval = |(rule, validator): &(&Rule, Arc<dyn Validator>)| run_one(rule, validator, snapshot);

    let results: Vec<ValidationResult> = match parallelism {
        Parallelism::Sequential => bound.iter().map(eval).collect(),
        Parallelism::Default => bound.par_iter().map(eval).collect(),
        Parallelism::Threads(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n.max(1))
                .build()
                .map_err(|e| ConfigurationError::ThreadPool(e.to_string()))?;
            pool.install(|| bound.par_iter().map(eval).collect())
        }
    };

    let errors = results.iter().filter(|r| r.is_engine_error()).count();
    log::debug!(
        "collected {} results ({} passed, {} engine errors)",
        results.len(),
        results.iter().filter(|r| r.passed).count(),
        errors
    );
    Ok(results)
}

fn run_one(
    rule: &Rule,
    validator: &Arc<dyn Validator>,
    snapshot: &Snapshot,
) -> ValidationResult {
    let called = catch_unwind(AssertUnwindSafe(|| validator.validate(rule, snapshot)));
    let outcome: Result<Outcome, String> = match called {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(ValidatorError(cause))) => Err(cause),
        Err(payload) => Err(format!("validator panicked: {}", panic_message(&*payload))),
    };

    let outcome = outcome.and_then(|outcome| {
        rule.evidence_schema
            .conform(&outcome.evidence)
            .map(|()| outcome)
            .map_err(|mismatch| format!("evidence does not match schema: {mismatch}"))
    });

    match outcome {
        Ok(outcome) => ValidationResult {
            rule_id: rule.rule_id.clone(),
            passed: outcome.passed,
            evidence: outcome.evidence,
            priority: rule.priority,
            message: outcome.message,
        },
        Err(cause) => {
            log::warn!("rule {}: engine error: {cause}", rule.rule_id);
            ValidationResult::engine_error(&rule.rule_id, rule.priority, &cause)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
