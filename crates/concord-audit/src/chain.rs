use crate::entry::{GENESIS_HASH, WormEntry, hash_payload};
use crate::error::{AuditError, IntegrityViolation, WormError};
use crate::storage::{FileStorage, MemoryStorage, WormStorage};
use camino::Utf8PathBuf;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use time::OffsetDateTime;

/// Why an entry failed verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BrokenReason {
    /// The line is not a valid entry.
    Unreadable { message: String },
    /// `seq` is not one more than the previous entry's.
    Sequence { expected: u64, found: u64 },
    /// Stored `payload_hash` differs from the recomputed one.
    PayloadHash,
    /// `previous_hash` differs from the recomputed hash of the previous payload.
    Link,
    /// Intact on its own, but follows a broken entry.
    AfterBreak,
}

impl fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokenReason::Unreadable { message } => write!(f, "unreadable entry: {message}"),
            BrokenReason::Sequence { expected, found } => {
                write!(f, "sequence gap: expected seq {expected}, found {found}")
            }
            BrokenReason::PayloadHash => f.write_str("payload hash mismatch"),
            BrokenReason::Link => f.write_str("previous_hash does not match previous payload"),
            BrokenReason::AfterBreak => f.write_str("follows a broken entry"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BrokenEntry {
    /// 1-based line position (equal to `seq` in an intact log).
    pub seq: u64,
    pub reason: BrokenReason,
}

/// Result of recomputing every hash and link of a log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChainVerification {
    pub entries: u64,
    /// The first broken entry and every entry after it.
    pub broken: Vec<BrokenEntry>,
}

impl ChainVerification {
    pub fn is_intact(&self) -> bool {
        self.broken.is_empty()
    }

    pub fn first_broken(&self) -> Option<u64> {
        self.broken.first().map(|b| b.seq)
    }

    pub fn into_result(self) -> Result<Self, IntegrityViolation> {
        match self.first_broken() {
            None => Ok(self),
            Some(first) => Err(IntegrityViolation {
                first,
                broken: self.broken,
            }),
        }
    }
}

/// Hash-chained append-only log over a storage backend.
///
/// Appends and verification serialize behind an in-process mutex and the backend's own lock.
pub struct WormLog<S: WormStorage> {
    storage: Mutex<S>,
    clock: fn() -> OffsetDateTime,
}

impl WormLog<FileStorage> {
    pub fn open(path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(FileStorage::new(path))
    }
}

impl WormLog<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<S: WormStorage> WormLog<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Mutex::new(storage),
            clock: OffsetDateTime::now_utc,
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn into_inner(self) -> S {
        self.storage
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `payload` as a new entry linked to the current last entry.
    pub fn append(&self, payload: Value) -> Result<WormEntry, WormError> {
        self.append_with(|_| Ok(payload))
    }

    /// Append a correction of entry `corrects`. The corrected entry is left untouched.
    pub fn append_correction(
        &self,
        corrects: u64,
        reason: &str,
        payload: Value,
    ) -> Result<WormEntry, WormError> {
        self.append_with(|last_seq| {
            if corrects == 0 || corrects > last_seq {
                return Err(WormError::UnknownEntry(corrects));
            }
            Ok(WormEntry::correction_payload(corrects, reason, payload))
        })
    }

    fn append_with(
        &self,
        build: impl FnOnce(u64) -> Result<Value, WormError>,
    ) -> Result<WormEntry, WormError> {
        let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = storage.lock()?;

        let lines = storage.read_lines()?;
        let (seq, previous_hash) = match lines.last() {
            None => (1, GENESIS_HASH.to_string()),
            Some(line) => {
                let last: WormEntry =
                    serde_json::from_slice(line).map_err(|e| WormError::Corrupt {
                        line: lines.len(),
                        message: e.to_string(),
                    })?;
                (last.seq + 1, last.payload_hash)
            }
        };

        let payload = build(seq - 1)?;
        let entry = WormEntry::seal(seq, (self.clock)(), &previous_hash, payload);
        let line = serde_json::to_string(&entry).map_err(|e| WormError::Encode(e.to_string()))?;
        storage.append_line(&line)?;

        log::info!(
            "audit entry {} appended to {} ({})",
            entry.seq,
            storage.location(),
            entry.payload_hash
        );
        Ok(entry)
    }

    /// Every entry, in order. Fails on the first unreadable line.
    pub fn entries(&self) -> Result<Vec<WormEntry>, WormError> {
        let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = storage.lock()?;
        storage
            .read_lines()?
            .iter()
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_slice(line).map_err(|e| WormError::Corrupt {
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Recompute every payload hash and link from the stored bytes.
    pub fn verify_chain(&self) -> Result<ChainVerification, WormError> {
        let lines = {
            let mut storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
            let _guard = storage.lock()?;
            storage.read_lines()?
        };
        let verification = verify_lines(&lines);
        match verification.first_broken() {
            None => log::debug!("audit chain intact ({} entries)", verification.entries),
            Some(first) => log::error!(
                "audit chain broken from entry {first} ({} of {} entries affected)",
                verification.broken.len(),
                verification.entries
            ),
        }
        Ok(verification)
    }

    /// `verify_chain`, with a broken chain surfaced as `IntegrityViolation`.
    pub fn ensure_intact(&self) -> Result<ChainVerification, AuditError> {
        Ok(self.verify_chain()?.into_result()?)
    }
}

/// Verify a log from its raw lines alone.
///
/// A line that is not valid UTF-8 or not a valid entry is `Unreadable`, never an I/O error.
pub(crate) fn verify_lines(lines: &[Vec<u8>]) -> ChainVerification {
    let mut broken = Vec::new();
    // Recomputed hash of the previous payload; `None` once a line was unreadable.
    let mut previous: Option<String> = Some(GENESIS_HASH.to_string());

    for (i, line) in lines.iter().enumerate() {
        let position = i as u64 + 1;
        let reason = match serde_json::from_slice::<WormEntry>(line) {
            Err(e) => {
                previous = None;
                Some(BrokenReason::Unreadable {
                    message: e.to_string(),
                })
            }
            Ok(entry) => {
                let recomputed = hash_payload(&entry.payload);
                let reason = if entry.seq != position {
                    Some(BrokenReason::Sequence {
                        expected: position,
                        found: entry.seq,
                    })
                } else if entry.payload_hash != recomputed {
                    Some(BrokenReason::PayloadHash)
                } else if previous.as_deref() != Some(entry.previous_hash.as_str()) {
                    Some(BrokenReason::Link)
                } else {
                    None
                };
                previous = Some(recomputed);
                reason
            }
        };

        match reason {
            Some(reason) => broken.push(BrokenEntry {
                seq: position,
                reason,
            }),
            None if !broken.is_empty() => broken.push(BrokenEntry {
                seq: position,
                reason: BrokenReason::AfterBreak,
            }),
            None => {}
        }
    }

    ChainVerification {
        entries: lines.len() as u64,
        broken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_clock() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH
    }

    fn log_with(n: u64) -> WormLog<MemoryStorage> {
        let log = WormLog::in_memory().with_clock(fixed_clock);
        for i in 1..=n {
            log.append(json!({"run": i})).expect("append");
        }
        log
    }

    fn tampered(log: WormLog<MemoryStorage>, seq: usize, edit: impl Fn(&mut Value)) -> WormLog<MemoryStorage> {
        let mut lines = log.into_inner().into_lines();
        let mut v: Value = serde_json::from_slice(&lines[seq - 1]).expect("json");
        edit(&mut v);
        lines[seq - 1] = serde_json::to_vec(&v).expect("encode");
        WormLog::new(MemoryStorage::from_bytes(&lines.join(&b'\n')))
    }

    #[test]
    fn entries_link_to_previous_payload_hash() {
        let log = log_with(3);
        let entries = log.entries().expect("entries");
        assert_eq!(entries[0].previous_hash, GENESIS_HASH);
        assert_eq!(entries[0].seq, 1);
        for pair in entries.windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].payload_hash);
            assert_eq!(pair[1].seq, pair[0].seq + 1);
        }
        assert!(log.verify_chain().expect("verify").is_intact());
    }

    #[test]
    fn empty_log_is_intact() {
        let v = WormLog::in_memory().verify_chain().expect("verify");
        assert!(v.is_intact());
        assert_eq!(v.entries, 0);
    }

    #[test]
    fn tampered_payload_breaks_chain_from_that_entry() {
        let log = tampered(log_with(5), 3, |v| v["payload"]["run"] = json!(33));
        let v = log.verify_chain().expect("verify");
        let seqs: Vec<u64> = v.broken.iter().map(|b| b.seq).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
        assert_eq!(v.broken[0].reason, BrokenReason::PayloadHash);
        assert_eq!(v.broken[1].reason, BrokenReason::Link);
        assert_eq!(v.broken[2].reason, BrokenReason::AfterBreak);
    }

    #[test]
    fn rehashing_a_tampered_payload_still_breaks_the_next_link() {
        let log = tampered(log_with(4), 2, |v| {
            v["payload"]["run"] = json!(22);
            v["payload_hash"] = json!(hash_payload(&v["payload"]));
        });
        let v = log.verify_chain().expect("verify");
        assert_eq!(v.first_broken(), Some(3));
        assert_eq!(v.broken[0].reason, BrokenReason::Link);
    }

    #[test]
    fn ensure_intact_surfaces_integrity_violation() {
        let log = tampered(log_with(2), 1, |v| v["seq"] = json!(7));
        match log.ensure_intact() {
            Err(AuditError::Integrity(violation)) => {
                assert_eq!(violation.first, 1);
                assert_eq!(violation.broken.len(), 2);
                assert!(violation.to_string().contains("sequence gap"));
            }
            other => panic!("expected integrity violation, got {other:?}"),
        }
    }

    #[test]
    fn corrections_reference_existing_entries_only() {
        let log = log_with(2);
        let fix = log
            .append_correction(1, "wrong contract version", json!({"run": 1, "fixed": true}))
            .expect("correction");
        assert_eq!(fix.seq, 3);
        assert_eq!(fix.corrects(), Some(1));

        assert!(matches!(
            log.append_correction(9, "nope", json!({})),
            Err(WormError::UnknownEntry(9))
        ));
        assert!(matches!(
            log.append_correction(0, "nope", json!({})),
            Err(WormError::UnknownEntry(0))
        ));

        let entries = log.entries().expect("entries");
        assert_eq!(entries.len(), 3, "rejected corrections leave no entry");
        assert_eq!(entries[0].payload, json!({"run": 1}), "original untouched");
        assert!(log.verify_chain().expect("verify").is_intact());
    }

    #[test]
    fn unreadable_last_line_blocks_append() {
        let mut lines = log_with(1).into_inner().into_lines();
        lines.push(b"{not json".to_vec());
        let log = WormLog::new(MemoryStorage::from_bytes(&lines.join(&b'\n')));
        assert!(matches!(
            log.append(json!({})),
            Err(WormError::Corrupt { line: 2, .. })
        ));
        let v = log.verify_chain().expect("verify");
        assert_eq!(v.first_broken(), Some(2));
    }

    #[test]
    fn invalid_utf8_line_is_broken_not_an_error() {
        let mut lines = log_with(3).into_inner().into_lines();
        let at = lines[1]
            .windows(3)
            .position(|w| w == b"run")
            .expect("payload key");
        lines[1][at] = 0xFF;
        let log = WormLog::new(MemoryStorage::from_bytes(&lines.join(&b'\n')));

        let v = log.verify_chain().expect("verify");
        let seqs: Vec<u64> = v.broken.iter().map(|b| b.seq).collect();
        assert_eq!(seqs, vec![2, 3]);
        assert!(matches!(v.broken[0].reason, BrokenReason::Unreadable { .. }));
        assert!(matches!(log.ensure_intact(), Err(AuditError::Integrity(i)) if i.first == 2));
    }

    #[test]
    fn floats_survive_the_round_trip_through_storage() {
        let log = WormLog::in_memory().with_clock(fixed_clock);
        log.append(json!({"evidence": {"actual": 1.0715660391465826e-75}}))
            .expect("append");
        log.append(json!({"evidence": {"actual": 0.1 + 0.2, "max": 1e308}}))
            .expect("append");
        assert!(log.verify_chain().expect("verify").is_intact());
    }
}
