use anyhow::Context;
use camino::Utf8Path;
use concord_contract::{Contract, ContractFormat};
use concord_domain::Snapshot;
use concord_settings::{ConcordConfigV1, Overrides, ResolvedConfig};

/// Parse config text (empty means defaults) and apply CLI overrides.
pub fn resolve_settings(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        ConcordConfigV1::default()
    } else {
        concord_settings::parse_config_toml(config_text).context("parse config")?
    };
    concord_settings::resolve_config(cfg, overrides).context("resolve config")
}

/// Read and validate a contract. The format follows the file extension.
pub fn load_contract(path: &Utf8Path) -> anyhow::Result<Contract> {
    let format = ContractFormat::from_path(path.as_str())?;
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read contract {path}"))?;
    let contract = concord_contract::load(format.source(&text))
        .with_context(|| format!("load contract {path}"))?;
    log::info!(
        "loaded contract {path}: {} rules, digest {}",
        contract.len(),
        contract.digest()
    );
    Ok(contract)
}

/// Read an input snapshot: `.toml` files as TOML, anything else as JSON.
pub fn load_snapshot(path: &Utf8Path) -> anyhow::Result<Snapshot> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read snapshot {path}"))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let snapshot = if is_toml {
        Snapshot::from_toml_str(&text)
    } else {
        Snapshot::from_json_str(&text)
    };
    snapshot.with_context(|| format!("parse snapshot {path}"))
}
