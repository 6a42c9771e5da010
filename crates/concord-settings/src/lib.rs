//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{ConcordConfigV1, SCHEMA_CONFIG_V1};
pub use resolve::{DEFAULT_AUDIT_LOG, DEFAULT_CONTRACT, Overrides, ResolvedConfig};

/// Parse `concord.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ConcordConfigV1> {
    let cfg: ConcordConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective settings for a run (CLI overrides, then file, then defaults).
pub fn resolve_config(
    cfg: ConcordConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
