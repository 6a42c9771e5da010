//! Developer tasks (schema generation, explain coverage, golden normalization).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Project root (parent of the xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("determine current directory")?,
    };
    if manifest_dir.ends_with("xtask")
        && let Some(parent) = manifest_dir.parent()
    {
        return Ok(parent.to_path_buf());
    }
    Ok(manifest_dir)
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "concord.contract.v1.json",
            generate: || schema_for!(concord_contract::ContractDocV1),
        },
        SchemaSpec {
            filename: "concord.config.v1.json",
            generate: || schema_for!(concord_settings::ConcordConfigV1),
        },
        SchemaSpec {
            filename: "concord.report.v1.json",
            generate: || schema_for!(concord_types::RunReport),
        },
        SchemaSpec {
            filename: "concord.evidence.v1.json",
            generate: || schema_for!(concord_types::EvidenceReport),
        },
        SchemaSpec {
            filename: "concord.policy-input.v1.json",
            generate: || schema_for!(concord_policy::PolicyInput),
        },
        SchemaSpec {
            filename: "concord.verdict.v1.json",
            generate: || schema_for!(concord_types::PolicyVerdict),
        },
    ]
}

/// Pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json).with_context(|| format!("write schema {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Fail if schemas in the repo differ from what would be generated.
fn check_schemas(dir: &Path) -> anyhow::Result<()> {
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("schema check failed")
}

/// Every check kind and code must have a complete explanation.
fn explain_coverage() -> anyhow::Result<()> {
    use concord_types::explain::{all_check_kinds, all_codes, lookup_explanation};

    let mut errors = Vec::new();
    for (what, ids) in [("Check kind", all_check_kinds()), ("Code", all_codes())] {
        for id in ids {
            let Some(exp) = lookup_explanation(id) else {
                errors.push(format!("{what} '{id}' has no explanation"));
                continue;
            };
            for (field, text) in [
                ("title", exp.title),
                ("description", exp.description),
                ("remediation", exp.remediation),
            ] {
                if text.trim().is_empty() {
                    errors.push(format!("{what} '{id}' has empty {field}"));
                }
            }
        }
    }

    if errors.is_empty() {
        println!("✓ {} check kinds have explanations", all_check_kinds().len());
        println!("✓ {} codes have explanations", all_codes().len());
        return Ok(());
    }
    for error in &errors {
        eprintln!("  - {error}");
    }
    bail!("explain coverage failed with {} errors", errors.len())
}

/// Print a report or audit log with timestamps, versions, and chained hashes normalized.
fn normalize(path: &Path) -> anyhow::Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let values = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => vec![concord_test_util::normalize_nondeterministic(value)],
        Err(_) => concord_test_util::normalize_audit_lines(&text),
    };
    for value in values {
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("serialize")?
        );
    }
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  check-schemas     Check that schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  explain-coverage  Validate all check kinds and codes have explanations");
    eprintln!("  normalize <FILE>  Print a report or audit log with nondeterministic fields masked");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(&schemas_dir()?),
        "check-schemas" => check_schemas(&schemas_dir()?),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        "normalize" => {
            let Some(path) = args.get(2) else {
                bail!("normalize requires a file argument");
            };
            normalize(Path::new(path))
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
