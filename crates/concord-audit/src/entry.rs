use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// `previous_hash` of the first entry.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Payload key under which a correction records what it corrects.
pub const CORRECTION_KEY: &str = "correction";

/// One line of the audit log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WormEntry {
    /// 1-based position in the log; the ID corrections refer to.
    pub seq: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub payload_hash: String,
    pub previous_hash: String,
    pub payload: Value,
}

/// SHA-256 of the canonical JSON encoding of `payload`, lowercase hex.
///
/// `serde_json` objects keep keys sorted, so equal payloads always encode to equal bytes.
pub fn hash_payload(payload: &Value) -> String {
    let bytes = serde_json::to_vec(payload).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(&hasher.finalize()[..])
}

impl WormEntry {
    pub fn seal(seq: u64, timestamp: OffsetDateTime, previous_hash: &str, payload: Value) -> Self {
        Self {
            seq,
            timestamp,
            payload_hash: hash_payload(&payload),
            previous_hash: previous_hash.to_string(),
            payload,
        }
    }

    /// Payload of an entry that corrects entry `corrects`.
    pub fn correction_payload(corrects: u64, reason: &str, payload: Value) -> Value {
        json!({
            CORRECTION_KEY: { "corrects": corrects, "reason": reason },
            "payload": payload,
        })
    }

    /// The `seq` this entry corrects, if it is a correction.
    pub fn corrects(&self) -> Option<u64> {
        self.payload
            .get(CORRECTION_KEY)
            .and_then(|c| c.get("corrects"))
            .and_then(Value::as_u64)
    }
}
