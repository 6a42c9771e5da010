//! The `explain` and `rules` use cases: describe contract rules, check kinds, and codes.

use concord_contract::Contract;
use concord_types::explain::{self, Explanation};
use concord_types::{Bucket, Rule};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    /// The identifier is a rule in the loaded contract.
    Rule(Box<Rule>),
    /// The identifier is a built-in check kind or code.
    Builtin(Explanation),
    /// Unknown identifier; includes everything that could have been meant.
    NotFound {
        identifier: String,
        rule_ids: Vec<String>,
        check_kinds: &'static [&'static str],
        codes: &'static [&'static str],
    },
}

/// Look up `identifier`. Contract rules win over built-in identifiers.
pub fn run_explain(contract: Option<&Contract>, identifier: &str) -> ExplainOutput {
    if let Some(rule) = contract.and_then(|c| c.get(identifier)) {
        return ExplainOutput::Rule(Box::new(rule.clone()));
    }
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Builtin(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            rule_ids: contract
                .map(|c| c.rule_ids().map(str::to_string).collect())
                .unwrap_or_default(),
            check_kinds: explain::all_check_kinds(),
            codes: explain::all_codes(),
        },
    }
}

/// Format a contract rule for terminal display.
pub fn format_rule(rule: &Rule) -> String {
    let mut out = String::new();

    let heading = format!("{}: {}", rule.rule_id, rule.title);
    out.push_str(&heading);
    out.push('\n');
    out.push_str(&"=".repeat(heading.chars().count()));
    out.push_str("\n\n");
    out.push_str(&format!(
        "Priority: {} (fails into {})\n",
        rule.priority,
        Bucket::for_priority(rule.priority).as_str()
    ));
    if let Some(description) = &rule.description {
        out.push('\n');
        out.push_str(description);
        out.push('\n');
    }

    out.push_str("\nEvidence schema\n");
    out.push_str("---------------\n");
    if rule.evidence_schema.is_empty() {
        out.push_str("  (no fields)\n");
    }
    for (name, spec) in rule.evidence_schema.fields() {
        out.push_str(&format!("  {name}: {spec}\n"));
    }

    out.push_str("\nValidator\n");
    out.push_str("---------\n");
    match &rule.check {
        Some(check) => {
            out.push_str(&format!("  built-in `{}`", check.kind()));
            let paths = check.paths();
            if !paths.is_empty() {
                out.push_str(&format!(" on {}", paths.join(", ")));
            }
            out.push('\n');
        }
        None => out.push_str("  custom (must be registered by the embedding program)\n"),
    }

    out
}

/// One line per rule: ID, priority, title.
pub fn format_rules(contract: &Contract) -> String {
    let width = contract
        .rule_ids()
        .map(|id| id.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for rule in contract.rules() {
        out.push_str(&format!(
            "{:<width$}  {:<6}  {}\n",
            rule.rule_id,
            rule.priority.as_str(),
            rule.title
        ));
    }
    out
}

/// Format a built-in explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.len()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\n");
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    out.push_str(exp.remediation);
    out.push_str("\n\n");
    out.push_str("Examples\n");
    out.push_str("--------\n\n");
    out.push_str("Failing:\n");
    out.push_str("```\n");
    out.push_str(exp.examples.before);
    out.push('\n');
    out.push_str("```\n\n");
    out.push_str("Passing:\n");
    out.push_str("```\n");
    out.push_str(exp.examples.after);
    out.push('\n');
    out.push_str("```\n");

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    rule_ids: &[String],
    check_kinds: &[&'static str],
    codes: &[&'static str],
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown rule_id, check kind, or code: {identifier}\n"));
    if !rule_ids.is_empty() {
        out.push_str("\nContract rules:\n");
        for id in rule_ids {
            out.push_str(&format!("  - {id}\n"));
        }
    }
    out.push_str("\nCheck kinds:\n");
    for kind in check_kinds {
        out.push_str(&format!("  - {kind}\n"));
    }
    out.push_str("\nCodes:\n");
    for code in codes {
        out.push_str(&format!("  - {code}\n"));
    }

    out
}
