use crate::error::ContractError;
use crate::model::{ContractDocV1, RuleDoc, SCHEMA_CONTRACT_V1};
use concord_types::{CheckSpec, EvidenceSchema, FieldSpec, FieldType, Priority, Rule};
use globset::Glob;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Contract source text tagged with its format.
#[derive(Clone, Copy, Debug)]
pub enum ContractSource<'a> {
    Toml(&'a str),
    Json(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractFormat {
    Toml,
    Json,
}

impl ContractFormat {
    /// Pick the format from a file name's extension.
    pub fn from_path(path: &str) -> Result<Self, ContractError> {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".toml") {
            Ok(ContractFormat::Toml)
        } else if lower.ends_with(".json") {
            Ok(ContractFormat::Json)
        } else {
            Err(ContractError::UnsupportedFormat(path.to_string()))
        }
    }

    pub fn source<'a>(self, text: &'a str) -> ContractSource<'a> {
        match self {
            ContractFormat::Toml => ContractSource::Toml(text),
            ContractFormat::Json => ContractSource::Json(text),
        }
    }
}

/// A validated, immutable set of rules in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Contract {
    rules: Vec<Rule>,
    index: BTreeMap<String, usize>,
}

impl Contract {
    /// Build a contract from already-typed rules, enforcing the same invariants as `load`.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, ContractError> {
        if rules.is_empty() {
            return Err(ContractError::Empty);
        }
        let mut index = BTreeMap::new();
        for (i, rule) in rules.iter().enumerate() {
            if rule.rule_id.trim().is_empty() {
                return Err(ContractError::EmptyRuleId { index: i });
            }
            if index.insert(rule.rule_id.clone(), i).is_some() {
                return Err(ContractError::DuplicateRuleId(rule.rule_id.clone()));
            }
            if let Some(check) = &rule.check {
                validate_check(&rule.rule_id, check)?;
                ensure_schema_covers_check(&rule.rule_id, &rule.evidence_schema, check)?;
            }
        }
        Ok(Self { rules, index })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, rule_id: &str) -> Option<&Rule> {
        self.index.get(rule_id).map(|&i| &self.rules[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.rule_id.as_str())
    }

    /// Restrict the contract to `rule_ids`, keeping contract order.
    pub fn select(&self, rule_ids: &[String]) -> Result<Contract, ContractError> {
        let wanted: BTreeSet<&str> = rule_ids.iter().map(|s| s.trim()).collect();
        if let Some(unknown) = wanted.iter().find(|id| !self.index.contains_key(**id)) {
            return Err(ContractError::UnknownRule(unknown.to_string()));
        }
        let rules = self
            .rules
            .iter()
            .filter(|r| wanted.contains(r.rule_id.as_str()))
            .cloned()
            .collect();
        Contract::from_rules(rules)
    }

    /// SHA-256 over the canonical JSON encoding of the rules.
    pub fn digest(&self) -> String {
        // Rule serialization cannot fail: all map keys are strings.
        let bytes = serde_json::to_vec(&self.rules).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(&hasher.finalize()[..])
    }
}

/// Parse and validate a contract. No side effects.
pub fn load(source: ContractSource<'_>) -> Result<Contract, ContractError> {
    let doc: ContractDocV1 = match source {
        ContractSource::Toml(text) => toml::from_str(text).map_err(|e| ContractError::Parse {
            format: "toml",
            message: e.to_string(),
        })?,
        ContractSource::Json(text) => {
            serde_json::from_str(text).map_err(|e| ContractError::Parse {
                format: "json",
                message: e.to_string(),
            })?
        }
    };

    if let Some(schema) = doc.schema.as_deref()
        && schema != SCHEMA_CONTRACT_V1
    {
        return Err(ContractError::UnsupportedSchema(schema.to_string()));
    }

    let from_toml = matches!(source, ContractSource::Toml(_));
    let rules = doc
        .rules
        .into_iter()
        .enumerate()
        .map(|(i, doc)| rule_from_doc(i, doc, from_toml))
        .collect::<Result<Vec<_>, _>>()?;

    Contract::from_rules(rules)
}

/// TOML has no null, so a null inside a TOML check can only be a `nan` or `inf` that did
/// not survive conversion to JSON.
fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}

fn rule_from_doc(index: usize, doc: RuleDoc, from_toml: bool) -> Result<Rule, ContractError> {
    let rule_id = doc.rule_id.trim().to_string();
    if rule_id.is_empty() {
        return Err(ContractError::EmptyRuleId { index });
    }

    let priority: Priority =
        doc.priority
            .parse()
            .map_err(|message| ContractError::InvalidPriority {
                rule_id: rule_id.clone(),
                message,
            })?;

    if from_toml && doc.check.as_ref().is_some_and(contains_null) {
        return Err(ContractError::InvalidCheck {
            rule_id,
            message: "check parameters must be finite numbers (found nan or inf)".to_string(),
        });
    }

    let check = doc
        .check
        .map(|raw| {
            serde_json::from_value::<CheckSpec>(raw).map_err(|e| ContractError::InvalidCheck {
                rule_id: rule_id.clone(),
                message: e.to_string(),
            })
        })
        .transpose()?;

    let evidence_schema = match (doc.evidence, &check) {
        (Some(fields), _) => parse_schema(&rule_id, fields)?,
        (None, Some(check)) => check.default_schema(),
        (None, None) => {
            return Err(ContractError::MalformedSchema {
                rule_id,
                message: "rule declares neither `evidence` nor a built-in `check`".to_string(),
            });
        }
    };

    Ok(Rule {
        rule_id,
        priority,
        title: doc.title,
        description: doc.description,
        evidence_schema,
        check,
    })
}

fn parse_schema(
    rule_id: &str,
    fields: BTreeMap<String, String>,
) -> Result<EvidenceSchema, ContractError> {
    fields
        .into_iter()
        .map(|(name, ty)| {
            if name.trim().is_empty() {
                return Err(ContractError::MalformedSchema {
                    rule_id: rule_id.to_string(),
                    message: "evidence field names must not be empty".to_string(),
                });
            }
            let spec: FieldSpec = ty.parse().map_err(|message| ContractError::MalformedSchema {
                rule_id: rule_id.to_string(),
                message: format!("field '{name}': {message}"),
            })?;
            Ok((name, spec))
        })
        .collect()
}

fn validate_check(rule_id: &str, check: &CheckSpec) -> Result<(), ContractError> {
    if let Some(message) = check.shape_problem() {
        return Err(ContractError::InvalidCheck {
            rule_id: rule_id.to_string(),
            message,
        });
    }
    if let CheckSpec::Matches { pattern, .. } = check {
        Glob::new(pattern).map_err(|e| ContractError::InvalidCheck {
            rule_id: rule_id.to_string(),
            message: format!("invalid glob pattern {pattern}: {e}"),
        })?;
    }
    Ok(())
}

/// A declared schema must accept everything the bound check can emit, and must not
/// require fields the check never emits.
fn ensure_schema_covers_check(
    rule_id: &str,
    declared: &EvidenceSchema,
    check: &CheckSpec,
) -> Result<(), ContractError> {
    let emitted = check.default_schema();
    let malformed = |message: String| ContractError::MalformedSchema {
        rule_id: rule_id.to_string(),
        message,
    };

    for (name, spec) in emitted.fields() {
        let Some(decl) = declared.get(name) else {
            return Err(malformed(format!(
                "`{}` check emits '{name}' but the schema does not declare it",
                check.kind()
            )));
        };
        if decl.ty != spec.ty && decl.ty != FieldType::Any {
            return Err(malformed(format!(
                "field '{name}' is declared {} but the `{}` check emits {}",
                decl,
                check.kind(),
                spec
            )));
        }
        if spec.optional && !decl.optional {
            return Err(malformed(format!(
                "field '{name}' is optional for the `{}` check and must be declared '{}?'",
                check.kind(),
                decl.ty.as_str()
            )));
        }
    }

    for (name, decl) in declared.fields() {
        if !decl.optional && emitted.get(name).is_none() {
            return Err(malformed(format!(
                "field '{name}' is required but the `{}` check never emits it",
                check.kind()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
schema = "concord.contract.v1"

[[rules]]
rule_id = "R1"
priority = "must"
title = "TLS enabled"
check = { kind = "equals", path = "tls.enabled", value = true }

[[rules]]
rule_id = "R2"
priority = "should"
title = "Owner recorded"
check = { kind = "present", path = "owner" }

[[rules]]
rule_id = "R3"
priority = "have"
title = "Custom validator"

[rules.evidence]
score = "number"
note = "string?"
"#;

    #[test]
    fn loads_rules_in_declaration_order() {
        let contract = load(ContractSource::Toml(BASIC)).expect("load");
        let ids: Vec<_> = contract.rule_ids().collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);

        let r1 = contract.get("R1").expect("R1");
        assert_eq!(r1.priority, Priority::Must);
        assert_eq!(
            r1.evidence_schema,
            r1.check.as_ref().expect("check").default_schema()
        );

        let r3 = contract.get("R3").expect("R3");
        assert_eq!(r3.priority, Priority::Have);
        assert!(r3.check.is_none());
        assert_eq!(
            r3.evidence_schema.get("note"),
            Some(&FieldSpec::optional(FieldType::String))
        );
    }

    #[test]
    fn json_and_toml_produce_the_same_contract() {
        let json = r#"{
            "rules": [
                {"rule_id": "R1", "priority": "must", "title": "TLS enabled",
                 "check": {"kind": "equals", "path": "tls.enabled", "value": true}}
            ]
        }"#;
        let toml = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "TLS enabled"
check = { kind = "equals", path = "tls.enabled", value = true }
"#;
        let a = load(ContractSource::Json(json)).expect("json");
        let b = load(ContractSource::Toml(toml)).expect("toml");
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn duplicate_rule_id_is_rejected() {
        let text = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "present", path = "a" }

[[rules]]
rule_id = "R1"
priority = "have"
title = "b"
check = { kind = "present", path = "b" }
"#;
        assert_eq!(
            load(ContractSource::Toml(text)),
            Err(ContractError::DuplicateRuleId("R1".into()))
        );
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let text = r#"
[[rules]]
rule_id = "R1"
priority = "could"
title = "a"
check = { kind = "present", path = "a" }
"#;
        assert!(matches!(
            load(ContractSource::Toml(text)),
            Err(ContractError::InvalidPriority { rule_id, .. }) if rule_id == "R1"
        ));
    }

    #[test]
    fn malformed_schema_type_is_rejected() {
        let text = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"

[rules.evidence]
score = "float"
"#;
        assert!(matches!(
            load(ContractSource::Toml(text)),
            Err(ContractError::MalformedSchema { .. })
        ));
    }

    #[test]
    fn rule_without_schema_or_check_is_rejected() {
        let text = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
"#;
        assert!(matches!(
            load(ContractSource::Toml(text)),
            Err(ContractError::MalformedSchema { .. })
        ));
    }

    #[test]
    fn declared_schema_must_cover_check_output() {
        let text = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "present", path = "a" }

[rules.evidence]
path = "string"
present = "bool"
"#;
        let err = load(ContractSource::Toml(text)).expect_err("schema omits missing_field");
        assert!(err.to_string().contains("missing_field"), "{err}");
    }

    #[test]
    fn declared_schema_may_widen_to_any() {
        let text = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "present", path = "a" }

[rules.evidence]
path = "any"
present = "bool"
missing_field = "string?"
resolved_prefix = "any?"
"#;
        assert!(load(ContractSource::Toml(text)).is_ok());
    }

    #[test]
    fn bad_glob_and_unknown_kind_are_invalid_checks() {
        let bad_glob = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "matches", path = "a", pattern = "[" }
"#;
        assert!(matches!(
            load(ContractSource::Toml(bad_glob)),
            Err(ContractError::InvalidCheck { .. })
        ));

        let unknown_kind = r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "a"
check = { kind = "exists_somewhere", path = "a" }
"#;
        assert!(matches!(
            load(ContractSource::Toml(unknown_kind)),
            Err(ContractError::InvalidCheck { .. })
        ));
    }

    #[test]
    fn empty_contract_and_empty_id_are_rejected() {
        assert_eq!(load(ContractSource::Toml("")), Err(ContractError::Empty));
        let text = r#"
[[rules]]
rule_id = "  "
priority = "must"
title = "a"
check = { kind = "present", path = "a" }
"#;
        assert_eq!(
            load(ContractSource::Toml(text)),
            Err(ContractError::EmptyRuleId { index: 0 })
        );
    }

    #[test]
    fn select_keeps_contract_order_and_rejects_unknown_ids() {
        let contract = load(ContractSource::Toml(BASIC)).expect("load");
        let subset = contract
            .select(&["R3".to_string(), "R1".to_string()])
            .expect("select");
        assert_eq!(subset.rule_ids().collect::<Vec<_>>(), vec!["R1", "R3"]);

        assert_eq!(
            contract.select(&["R9".to_string()]),
            Err(ContractError::UnknownRule("R9".into()))
        );
    }

    #[test]
    fn digest_changes_with_rule_content() {
        let a = load(ContractSource::Toml(BASIC)).expect("load");
        let b = load(ContractSource::Toml(&BASIC.replace("\"should\"", "\"must\""))).expect("load");
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn format_is_picked_from_extension() {
        assert_eq!(
            ContractFormat::from_path("rules/contract.TOML"),
            Ok(ContractFormat::Toml)
        );
        assert_eq!(
            ContractFormat::from_path("contract.json"),
            Ok(ContractFormat::Json)
        );
        assert!(ContractFormat::from_path("contract.yaml").is_err());
    }

    #[test]
    fn unknown_contract_schema_is_rejected() {
        let text = BASIC.replace("concord.contract.v1", "concord.contract.v2");
        assert_eq!(
            load(ContractSource::Toml(&text)),
            Err(ContractError::UnsupportedSchema("concord.contract.v2".into()))
        );

        let without = BASIC.replace("schema = \"concord.contract.v1\"", "");
        assert!(load(ContractSource::Toml(&without)).is_ok());
    }

    #[test]
    fn non_finite_range_bounds_are_rejected() {
        for bound in ["nan", "inf", "-inf"] {
            for (min, max) in [(bound, "1.0"), ("0.0", bound)] {
                let text = format!(
                    r#"
[[rules]]
rule_id = "R1"
priority = "must"
title = "bounded"
check = {{ kind = "range", path = "p", min = {min}, max = {max} }}
"#
                );
                assert!(
                    matches!(
                        load(ContractSource::Toml(&text)),
                        Err(ContractError::InvalidCheck { .. })
                    ),
                    "min = {min}, max = {max}"
                );
            }
        }
    }
}
