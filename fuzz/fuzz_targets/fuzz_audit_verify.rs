//! Fuzz target for audit chain verification.
//!
//! Goal: verifying arbitrary log bytes, UTF-8 or not, should **never panic** or error, and
//! once an entry is reported broken every later entry must be reported broken too.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_audit_verify
//! ```

#![no_main]

use concord_audit::{MemoryStorage, WormLog};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let log = WormLog::new(MemoryStorage::from_bytes(data));
    let verification = log
        .verify_chain()
        .expect("in-memory verification reports broken entries, never errors");
    if let Some(first) = verification.first_broken() {
        let expected = verification.entries - first + 1;
        assert_eq!(verification.broken.len() as u64, expected);
    }
});
