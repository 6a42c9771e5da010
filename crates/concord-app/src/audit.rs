//! Audit log use cases: verify the chain and append corrections.

use anyhow::Context;
use concord_audit::{ChainVerification, WormEntry, WormLog};
use concord_settings::Overrides;
use serde_json::Value;

use crate::load::resolve_settings;

#[derive(Clone, Debug)]
pub struct AuditOutput {
    /// Resolved audit log path.
    pub path: String,
    pub verification: ChainVerification,
}

/// Recompute every hash and link of the configured audit log.
///
/// A broken chain is reported in the output, not as an error; callers decide the exit code.
/// A log that does not exist yet verifies as an empty, intact chain.
pub fn run_verify_audit(config_text: &str, overrides: Overrides) -> anyhow::Result<AuditOutput> {
    let resolved = resolve_settings(config_text, overrides)?;
    let log = WormLog::open(resolved.audit_log.as_str());
    let verification = log
        .verify_chain()
        .with_context(|| format!("verify audit log {}", resolved.audit_log))?;
    Ok(AuditOutput {
        path: resolved.audit_log,
        verification,
    })
}

/// Append a correction of entry `corrects`. The corrected entry stays in the log unchanged.
pub fn run_correct_audit(
    config_text: &str,
    overrides: Overrides,
    corrects: u64,
    reason: &str,
    payload: Value,
) -> anyhow::Result<WormEntry> {
    let resolved = resolve_settings(config_text, overrides)?;
    let path = resolved.audit_log;
    let log = WormLog::open(path.as_str());
    log.ensure_intact()
        .with_context(|| format!("verify audit log {path}"))?;
    let entry = log
        .append_correction(corrects, reason, payload)
        .with_context(|| format!("append correction to {path}"))?;
    log::info!("entry {} corrects entry {corrects}", entry.seq);
    Ok(entry)
}

/// Human-readable verification summary.
pub fn format_verification(output: &AuditOutput) -> String {
    let v = &output.verification;
    if v.is_intact() {
        return format!("{}: {} entries, chain intact\n", output.path, v.entries);
    }
    let mut out = format!(
        "{}: {} entries, chain BROKEN from entry {}\n",
        output.path,
        v.entries,
        v.first_broken().unwrap_or_default()
    );
    for b in &v.broken {
        out.push_str(&format!("  #{}: {}\n", b.seq, b.reason));
    }
    out
}
