//! Fuzz target for contract parsing.
//!
//! Goal: loading a contract should **never panic** on any input.
//! Invalid documents must come back as `ContractError`.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_contract_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(contract) = concord_contract::parse_contract_toml(text) {
            // A loaded contract always has unique, non-empty IDs.
            assert!(contract.rule_ids().all(|id| !id.is_empty()));
            let _ = contract.digest();
        }
        let _ = concord_contract::parse_contract_json(text);
    }
});
