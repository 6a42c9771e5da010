//! CLI entry point for concord.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `concord-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use concord_app::{
    CheckInput, ExplainOutput, classify_fault, format_explanation, format_not_found,
    format_rule, format_rules, format_verification, load_contract, resolve_settings, run_check,
    run_correct_audit, run_explain, run_verify_audit,
};
use concord_domain::FatalExit;
use concord_settings::Overrides;
use concord_types::Bucket;

#[derive(Parser, Debug)]
#[command(
    name = "concord",
    version,
    about = "Dual-layer compliance rule engine with a hash-chained audit log"
)]
struct Cli {
    /// Path to concord config TOML. A missing file means defaults.
    #[arg(long, default_value = "concord.toml")]
    config: Utf8PathBuf,

    /// Override the rule contract path.
    #[arg(long)]
    contract: Option<String>,

    /// Override the audit log path.
    #[arg(long)]
    audit_log: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate an input snapshot against the contract and record the verdict.
    Check {
        /// Input snapshot (JSON, or TOML by extension).
        #[arg(long)]
        input: Utf8PathBuf,

        /// Only evaluate these rule IDs (comma separated).
        #[arg(long, value_delimiter = ',')]
        rules: Option<Vec<String>>,

        /// Also write the bare evidence report here.
        #[arg(long)]
        export_evidence: Option<Utf8PathBuf>,

        /// External declarative evaluator to cross-check against (run through the shell).
        #[arg(long)]
        policy_cmd: Option<String>,

        /// Where to write the JSON run report.
        #[arg(long)]
        report_out: Option<String>,

        /// Do not append the verdict to the audit log.
        #[arg(long)]
        no_audit: bool,

        /// Validator threads (1 runs sequentially).
        #[arg(long)]
        threads: Option<u32>,
    },

    /// Recompute every hash and link of the audit log. Exits 4 if the chain is broken.
    VerifyAudit,

    /// Append an entry correcting an earlier one. Nothing is ever edited in place.
    CorrectAudit {
        /// `seq` of the entry being corrected.
        seq: u64,

        /// Why the entry is being corrected.
        #[arg(long)]
        reason: String,

        /// Corrected payload as JSON.
        #[arg(long, default_value = "{}")]
        payload: String,
    },

    /// Explain a rule, a built-in check kind, or a code.
    Explain {
        /// Rule ID from the contract, check kind (e.g. "one_of"), or code (e.g. "missing_field").
        identifier: String,
    },

    /// List the contract's rules with priority and title.
    Rules,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors must not collide with the verdict codes 1 and 2.
            let code = if err.use_stderr() {
                FatalExit::EngineFault.code()
            } else {
                0
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            let fatal = classify_fault(&err);
            eprintln!("concord: {err:#}");
            if fatal == FatalExit::TrustFault {
                eprintln!("concord: output is not trusted; nothing was recorded");
            }
            fatal.code()
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config_text = read_config(&cli.config)?;
    let overrides = Overrides {
        contract: cli.contract,
        audit_log: cli.audit_log,
        ..Overrides::default()
    };

    match cli.cmd {
        Commands::Check {
            input,
            rules,
            export_evidence,
            policy_cmd,
            report_out,
            no_audit,
            threads,
        } => {
            let overrides = Overrides {
                report_out,
                threads,
                audit: no_audit.then_some(false),
                policy_cmd,
                ..overrides
            };
            cmd_check(&config_text, overrides, &input, rules, export_evidence)
        }
        Commands::VerifyAudit => cmd_verify_audit(&config_text, overrides),
        Commands::CorrectAudit {
            seq,
            reason,
            payload,
        } => cmd_correct_audit(&config_text, overrides, seq, &reason, &payload),
        Commands::Explain { identifier } => cmd_explain(&config_text, overrides, &identifier),
        Commands::Rules => cmd_rules(&config_text, overrides),
    }
}

/// Missing config is allowed (defaults apply); an unreadable one is not.
fn read_config(path: &Utf8Path) -> anyhow::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no config at {path}; using defaults");
            Ok(String::new())
        }
        Err(e) => Err(e).with_context(|| format!("read config {path}")),
    }
}

fn cmd_check(
    config_text: &str,
    overrides: Overrides,
    input: &Utf8Path,
    rules: Option<Vec<String>>,
    export_evidence: Option<Utf8PathBuf>,
) -> anyhow::Result<i32> {
    let mut check = CheckInput::new(config_text, overrides, input);
    check.rules = rules;
    check.export_evidence = export_evidence;

    let output = run_check(check)?;

    for result in output.results.iter().filter(|r| !r.passed) {
        let bucket = Bucket::for_priority(result.priority);
        println!("{:<5} {}: {}", bucket.as_str(), result.rule_id, result.message);
    }

    let verdict = &output.report.verdict;
    let recorded = match &output.audit_entry {
        Some(entry) => format!(", audit entry #{}", entry.seq),
        None => String::new(),
    };
    println!(
        "concord: {} (deny {}, warn {}, info {}){recorded}",
        output.decision.as_str(),
        verdict.deny.len(),
        verdict.warn.len(),
        verdict.info.len()
    );

    Ok(output.decision.code())
}

fn cmd_verify_audit(config_text: &str, overrides: Overrides) -> anyhow::Result<i32> {
    let output = run_verify_audit(config_text, overrides)?;
    print!("{}", format_verification(&output));
    if output.verification.is_intact() {
        Ok(0)
    } else {
        Ok(FatalExit::TrustFault.code())
    }
}

fn cmd_correct_audit(
    config_text: &str,
    overrides: Overrides,
    seq: u64,
    reason: &str,
    payload: &str,
) -> anyhow::Result<i32> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("parse --payload as JSON")?;
    let entry = run_correct_audit(config_text, overrides, seq, reason, payload)?;
    println!("concord: entry #{} corrects entry #{seq}", entry.seq);
    Ok(0)
}

fn cmd_explain(config_text: &str, overrides: Overrides, identifier: &str) -> anyhow::Result<i32> {
    let resolved = resolve_settings(config_text, overrides)?;
    let contract_path = Utf8Path::new(&resolved.contract);
    // Built-in identifiers stay explainable without a contract on disk.
    let contract = if contract_path.exists() {
        Some(load_contract(contract_path)?)
    } else {
        None
    };

    match run_explain(contract.as_ref(), identifier) {
        ExplainOutput::Rule(rule) => print!("{}", format_rule(&rule)),
        ExplainOutput::Builtin(exp) => print!("{}", format_explanation(&exp)),
        ExplainOutput::NotFound {
            identifier,
            rule_ids,
            check_kinds,
            codes,
        } => {
            eprint!(
                "{}",
                format_not_found(&identifier, &rule_ids, check_kinds, codes)
            );
            return Ok(FatalExit::EngineFault.code());
        }
    }
    Ok(0)
}

fn cmd_rules(config_text: &str, overrides: Overrides) -> anyhow::Result<i32> {
    let resolved = resolve_settings(config_text, overrides)?;
    let contract = load_contract(Utf8Path::new(&resolved.contract))?;
    print!("{}", format_rules(&contract));
    Ok(0)
}
