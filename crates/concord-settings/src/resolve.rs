use crate::model::{ConcordConfigV1, SCHEMA_CONFIG_V1};
use concord_domain::Parallelism;

pub const DEFAULT_CONTRACT: &str = "concord.contract.toml";
pub const DEFAULT_AUDIT_LOG: &str = ".concord/audit.jsonl";

/// Values supplied on the command line. `Some` wins over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub contract: Option<String>,
    pub audit_log: Option<String>,
    pub report_out: Option<String>,
    pub threads: Option<u32>,
    pub audit: Option<bool>,
    pub policy_cmd: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub contract: String,
    pub audit_log: String,
    pub report_out: Option<String>,
    pub parallelism: Parallelism,
    pub audit: bool,
    pub policy_cmd: Option<String>,
}

pub fn resolve_config(
    cfg: ConcordConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let contract = non_empty(
        "contract",
        overrides
            .contract
            .or(cfg.contract)
            .unwrap_or_else(|| DEFAULT_CONTRACT.to_string()),
    )?;
    let audit_log = non_empty(
        "audit_log",
        overrides
            .audit_log
            .or(cfg.audit_log)
            .unwrap_or_else(|| DEFAULT_AUDIT_LOG.to_string()),
    )?;
    let report_out = overrides
        .report_out
        .or(cfg.report_out)
        .map(|p| non_empty("report_out", p))
        .transpose()?;
    let policy_cmd = overrides
        .policy_cmd
        .or(cfg.policy_cmd)
        .map(|c| non_empty("policy_cmd", c))
        .transpose()?;

    let parallelism = match overrides.threads.or(cfg.threads) {
        None => Parallelism::Default,
        Some(0) => anyhow::bail!("threads must be at least 1"),
        Some(1) => Parallelism::Sequential,
        Some(n) => Parallelism::Threads(n as usize),
    };

    Ok(ResolvedConfig {
        contract,
        audit_log,
        report_out,
        parallelism,
        audit: overrides.audit.or(cfg.audit).unwrap_or(true),
        policy_cmd,
    })
}

fn non_empty(key: &str, value: String) -> anyhow::Result<String> {
    if value.trim().is_empty() {
        anyhow::bail!("{key} must not be empty");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let r = resolve_config(ConcordConfigV1::default(), Overrides::default()).expect("resolve");
        assert_eq!(r.contract, DEFAULT_CONTRACT);
        assert_eq!(r.audit_log, DEFAULT_AUDIT_LOG);
        assert_eq!(r.report_out, None);
        assert_eq!(r.parallelism, Parallelism::Default);
        assert!(r.audit);
        assert_eq!(r.policy_cmd, None);
    }

    #[test]
    fn cli_overrides_beat_file_values() {
        let cfg = parse_config_toml(
            r#"
schema = "concord.config.v1"
contract = "rules/file.toml"
audit_log = "file.jsonl"
threads = 4
audit = false
policy_cmd = "opa eval"
"#,
        )
        .expect("parse");
        let overrides = Overrides {
            contract: Some("cli.toml".into()),
            threads: Some(1),
            ..Overrides::default()
        };
        let r = resolve_config(cfg, overrides).expect("resolve");
        assert_eq!(r.contract, "cli.toml");
        assert_eq!(r.audit_log, "file.jsonl");
        assert_eq!(r.parallelism, Parallelism::Sequential);
        assert!(!r.audit);
        assert_eq!(r.policy_cmd.as_deref(), Some("opa eval"));
    }

    #[test]
    fn threads_map_to_parallelism() {
        let cfg = ConcordConfigV1 {
            threads: Some(6),
            ..ConcordConfigV1::default()
        };
        let r = resolve_config(cfg, Overrides::default()).expect("resolve");
        assert_eq!(r.parallelism, Parallelism::Threads(6));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero = ConcordConfigV1 {
            threads: Some(0),
            ..ConcordConfigV1::default()
        };
        assert!(resolve_config(zero, Overrides::default()).is_err());

        let blank = Overrides {
            policy_cmd: Some("  ".into()),
            ..Overrides::default()
        };
        assert!(resolve_config(ConcordConfigV1::default(), blank).is_err());

        let schema = ConcordConfigV1 {
            schema: Some("concord.config.v9".into()),
            ..ConcordConfigV1::default()
        };
        let err = resolve_config(schema, Overrides::default()).expect_err("schema");
        assert!(err.to_string().contains("v9"));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        assert!(parse_config_toml("contrct = \"typo.toml\"\n").is_err());
    }
}
