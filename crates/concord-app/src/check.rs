//! The `check` use case: collect evidence, evaluate both layers, and record the verdict.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use concord_audit::{WormEntry, WormLog};
use concord_domain::{ExitDecision, ExitState, Layer, Registry};
use concord_policy::{PolicyEngine, PolicyInput};
use concord_settings::{Overrides, ResolvedConfig};
use concord_types::{
    AuditPointer, EvidenceReport, RunData, RunReport, SCHEMA_REPORT_V1, ToolMeta,
    ValidationResult, ids,
};
use time::OffsetDateTime;

use crate::cross_check::CommandEngine;
use crate::load::{load_contract, load_snapshot, resolve_settings};

/// Input for the check use case.
pub struct CheckInput<'a> {
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Input snapshot (JSON, or TOML by extension).
    pub snapshot_path: &'a Utf8Path,
    /// Restrict the run to these rule IDs. Unknown IDs are an error.
    pub rules: Option<Vec<String>>,
    /// Also write the bare EvidenceReport here.
    pub export_evidence: Option<Utf8PathBuf>,
    /// Validators for custom rules. Built-in checks are bound on top.
    pub registry: Registry,
    /// External evaluator. Takes precedence over `policy_cmd` from the settings.
    pub external: Option<Box<dyn PolicyEngine + 'a>>,
}

impl<'a> CheckInput<'a> {
    pub fn new(config_text: &'a str, overrides: Overrides, snapshot_path: &'a Utf8Path) -> Self {
        Self {
            config_text,
            overrides,
            snapshot_path,
            rules: None,
            export_evidence: None,
            registry: Registry::new(),
            external: None,
        }
    }
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    pub report: RunReport,
    pub resolved: ResolvedConfig,
    /// Imperative results in contract order.
    pub results: Vec<ValidationResult>,
    pub decision: ExitDecision,
    /// `None` when auditing is disabled.
    pub audit_entry: Option<WormEntry>,
}

/// Run one evaluation end to end.
///
/// Any error returned here means no verdict was recorded: a consistency violation aborts
/// before the audit log is touched, and an audit failure aborts before a report is written.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    let resolved = resolve_settings(input.config_text, input.overrides)?;

    let contract = load_contract(Utf8Path::new(&resolved.contract))?;
    let contract = match &input.rules {
        Some(ids) => contract.select(ids).context("select rules")?,
        None => contract,
    };

    let snapshot = load_snapshot(input.snapshot_path)?;

    let mut registry = input.registry;
    registry
        .bind_builtins(&contract)
        .context("bind built-in checks")?;

    let results =
        concord_domain::run_all_with(&contract, &registry, &snapshot, resolved.parallelism)
            .context("collect evidence")?;
    let evidence = EvidenceReport::from_results(&results);

    if let Some(path) = &input.export_evidence {
        let bytes = evidence.to_json_bytes().context("serialize evidence")?;
        write_file(path, &bytes).with_context(|| format!("write evidence {path}"))?;
    }

    // The declarative layer sees the rules and the evidence, never the snapshot.
    let declarative = concord_policy::evaluate(contract.rules(), &evidence);
    let mut agreed = concord_domain::consistency::check(&results, &declarative).into_result()?;

    let external: Option<Box<dyn PolicyEngine + '_>> =
        match (input.external, resolved.policy_cmd.as_deref()) {
            (Some(engine), _) => Some(engine),
            (None, Some(cmd)) => Some(Box::new(CommandEngine::new(cmd))),
            (None, None) => None,
        };
    let external_cross_check = external.is_some();
    if let Some(engine) = external {
        let policy_input = PolicyInput::new(contract.rules(), evidence.clone());
        let verdict = engine
            .evaluate(&policy_input)
            .with_context(|| format!("external evaluator {}", engine.source_name()))?;
        agreed = agreed.confirm(Layer::External, &verdict)?;
        log::info!("external evaluator {} agreed", engine.source_name());
    }

    let mut state = ExitState::default();
    let decision = state.decide(&agreed);

    let engine_errors = results.iter().filter(|r| r.is_engine_error()).count();
    let mut report = RunReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: ids::TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at: OffsetDateTime::now_utc(),
        contract_digest: contract.digest(),
        verdict: agreed.into_inner(),
        exit: decision.summary(),
        data: RunData {
            rules_evaluated: count(results.len()),
            rules_passed: count(results.iter().filter(|r| r.passed).count()),
            engine_errors: count(engine_errors),
            selected_rules: input.rules,
            external_cross_check,
        },
        evidence,
        audit: None,
    };

    let audit_entry = if resolved.audit {
        let entry = record(&resolved.audit_log, &report)?;
        report.audit = Some(AuditPointer {
            seq: entry.seq,
            payload_hash: entry.payload_hash.clone(),
        });
        Some(entry)
    } else {
        log::warn!("audit disabled; verdict not recorded");
        None
    };

    if let Some(out) = &resolved.report_out {
        let bytes = serde_json::to_vec_pretty(&report).context("serialize report")?;
        write_file(Utf8Path::new(out), &bytes).with_context(|| format!("write report {out}"))?;
    }

    log::info!(
        "verdict {}: deny={} warn={} info={} ({} engine errors)",
        decision.as_str(),
        report.verdict.deny.len(),
        report.verdict.warn.len(),
        report.verdict.info.len(),
        engine_errors
    );

    Ok(CheckOutput {
        report,
        resolved,
        results,
        decision,
        audit_entry,
    })
}

/// Append the agreed report to the audit log. A broken chain is never extended.
fn record(path: &str, report: &RunReport) -> anyhow::Result<WormEntry> {
    let log = WormLog::open(path);
    log.ensure_intact()
        .with_context(|| format!("verify audit log {path}"))?;
    let payload = serde_json::to_value(report).context("serialize audit payload")?;
    let entry = log
        .append(payload)
        .with_context(|| format!("append audit log {path}"))?;
    log::info!("recorded audit entry {} in {path}", entry.seq);
    Ok(entry)
}

fn write_file(path: &Utf8Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
