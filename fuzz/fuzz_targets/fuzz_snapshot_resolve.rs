//! Fuzz target for field path parsing and snapshot resolution.
//!
//! Goal: resolving any path against any JSON snapshot should **never panic**. A path that
//! does not resolve must report a missing field.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_snapshot_resolve
//! ```

#![no_main]

use arbitrary::Arbitrary;
use concord_domain::Snapshot;
use concord_types::FieldPath;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    path: String,
    snapshot: String,
}

fuzz_target!(|input: Input| {
    let Ok(path) = FieldPath::parse(&input.path) else {
        return;
    };
    let Ok(snapshot) = Snapshot::from_json_str(&input.snapshot) else {
        return;
    };
    if let Err(missing) = snapshot.resolve(&path) {
        assert!(!missing.missing_field.is_empty());
    }
});
