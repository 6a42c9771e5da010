use crate::error::ContractError;
use crate::parse::{Contract, ContractSource, load};
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the active contract. Readers get a shared snapshot; a reload swaps the whole set
/// at once and only after the new contract validated completely.
#[derive(Debug)]
pub struct ContractStore {
    current: RwLock<Arc<Contract>>,
}

impl ContractStore {
    pub fn new(contract: Contract) -> Self {
        Self {
            current: RwLock::new(Arc::new(contract)),
        }
    }

    pub fn from_source(source: ContractSource<'_>) -> Result<Self, ContractError> {
        Ok(Self::new(load(source)?))
    }

    /// The contract active right now. Later reloads do not affect the returned value.
    pub fn current(&self) -> Arc<Contract> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Parse `source` and make it active. On error the previous contract stays active.
    pub fn reload(&self, source: ContractSource<'_>) -> Result<Arc<Contract>, ContractError> {
        let next = Arc::new(load(source)?);
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        log::info!(
            "contract reloaded: {} rules (was {}), digest {}",
            next.len(),
            guard.len(),
            next.digest()
        );
        *guard = Arc::clone(&next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "present", path = "a" }
"#;

    const TWO: &str = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "present", path = "a" }

[[rules]]
rule_id = "R2"
priority = "should"
title = "b"
check = { kind = "present", path = "b" }
"#;

    #[test]
    fn reload_swaps_whole_contract() {
        let store = ContractStore::from_source(ContractSource::Toml(ONE)).expect("store");
        let before = store.current();
        store.reload(ContractSource::Toml(TWO)).expect("reload");

        assert_eq!(before.len(), 1, "held snapshot is unaffected by reload");
        assert_eq!(store.current().len(), 2);
    }

    #[test]
    fn failed_reload_keeps_previous_contract() {
        let store = ContractStore::from_source(ContractSource::Toml(TWO)).expect("store");
        let broken = TWO.replace("\"should\"", "\"sometimes\"");
        assert!(store.reload(ContractSource::Toml(&broken)).is_err());
        assert_eq!(
            store.current().rule_ids().collect::<Vec<_>>(),
            vec!["R1", "R2"]
        );
    }
}
