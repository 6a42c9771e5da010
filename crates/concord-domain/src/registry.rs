use crate::checks::BuiltinCheck;
use crate::snapshot::Snapshot;
use concord_contract::Contract;
use concord_types::{EvidenceMap, Rule};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// What a validator reports for one rule. The collector attaches `rule_id` and `priority`.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub passed: bool,
    pub evidence: EvidenceMap,
    pub message: String,
}

impl Outcome {
    pub fn pass(message: impl Into<String>, evidence: EvidenceMap) -> Self {
        Self {
            passed: true,
            evidence,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>, evidence: EvidenceMap) -> Self {
        Self {
            passed: false,
            evidence,
            message: message.into(),
        }
    }
}

/// A validator could not produce an outcome. Recorded as an `ENGINE_ERROR` result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidatorError(pub String);

/// Imperative check for one rule.
///
/// Implementations must be pure: the same rule and snapshot always yield the same outcome.
/// The snapshot is shared read-only across concurrently running validators.
pub trait Validator: Send + Sync {
    fn validate(&self, rule: &Rule, snapshot: &Snapshot) -> Result<Outcome, ValidatorError>;
}

impl<F> Validator for F
where
    F: Fn(&Rule, &Snapshot) -> Result<Outcome, ValidatorError> + Send + Sync,
{
    fn validate(&self, rule: &Rule, snapshot: &Snapshot) -> Result<Outcome, ValidatorError> {
        self(rule, snapshot)
    }
}

/// Problems with how validators are wired to the contract. Fatal before any evidence exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no validator registered for rule(s): {}", .0.join(", "))]
    MissingValidator(Vec<String>),

    #[error("validator already registered for rule: {0}")]
    DuplicateValidator(String),

    #[error("rule {rule_id}: cannot bind built-in check: {message}")]
    InvalidCheck { rule_id: String, message: String },

    #[error("failed to build validator thread pool: {0}")]
    ThreadPool(String),
}

/// `rule_id -> validator` dispatch table, built once at startup and passed by reference.
#[derive(Clone, Default)]
pub struct Registry {
    validators: BTreeMap<String, Arc<dyn Validator>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("rule_ids", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a built-in validator for every rule that declares a `check`.
    pub fn from_contract(contract: &Contract) -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        registry.bind_builtins(contract)?;
        Ok(registry)
    }

    /// Bind built-in checks for contract rules that declare one and have no validator yet.
    pub fn bind_builtins(&mut self, contract: &Contract) -> Result<(), ConfigurationError> {
        for rule in contract.rules() {
            let Some(spec) = &rule.check else { continue };
            if self.validators.contains_key(&rule.rule_id) {
                continue;
            }
            let check = BuiltinCheck::compile(spec).map_err(|message| {
                ConfigurationError::InvalidCheck {
                    rule_id: rule.rule_id.clone(),
                    message,
                }
            })?;
            self.validators
                .insert(rule.rule_id.clone(), Arc::new(check));
        }
        Ok(())
    }

    pub fn register<V>(&mut self, rule_id: &str, validator: V) -> Result<(), ConfigurationError>
    where
        V: Validator + 'static,
    {
        if self.validators.contains_key(rule_id) {
            return Err(ConfigurationError::DuplicateValidator(rule_id.to_string()));
        }
        self.validators
            .insert(rule_id.to_string(), Arc::new(validator));
        Ok(())
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.validators.contains_key(rule_id)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Pair every contract rule with its validator, in contract order.
    pub(crate) fn bind<'c>(
        &self,
        contract: &'c Contract,
    ) -> Result<Vec<(&'c Rule, Arc<dyn Validator>)>, ConfigurationError> {
        let missing: Vec<String> = contract
            .rule_ids()
            .filter(|id| !self.validators.contains_key(*id))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingValidator(missing));
        }
        Ok(contract
            .rules()
            .iter()
            .filter_map(|rule| {
                self.validators
                    .get(&rule.rule_id)
                    .map(|v| (rule, Arc::clone(v)))
            })
            .collect())
    }
}
