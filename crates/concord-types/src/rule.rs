use crate::check::CheckSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// MoSCoW priority of a rule. `won't` rules are simply not written into a contract.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Must,
    Should,
    Have,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Must, Priority::Should, Priority::Have];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Must => "must",
            Priority::Should => "should",
            Priority::Have => "have",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "must" => Ok(Priority::Must),
            "should" => Ok(Priority::Should),
            "have" => Ok(Priority::Have),
            other => Err(format!(
                "unknown priority: {other} (expected must|should|have)"
            )),
        }
    }
}

/// Expected JSON shape of one evidence field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    Bool,
    Integer,
    Number,
    String,
    Array,
    Object,
    Any,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Bool => value.is_boolean(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::String => value.is_string(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Any => true,
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" | "boolean" => Ok(FieldType::Bool),
            "integer" | "int" => Ok(FieldType::Integer),
            "number" => Ok(FieldType::Number),
            "string" => Ok(FieldType::String),
            "array" => Ok(FieldType::Array),
            "object" => Ok(FieldType::Object),
            "any" => Ok(FieldType::Any),
            other => Err(format!(
                "unknown evidence type: {other} (expected bool|integer|number|string|array|object|any)"
            )),
        }
    }
}

/// One evidence schema entry, written as `"type"` or `"type?"` for optional fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
#[schemars(with = "String")]
pub struct FieldSpec {
    pub ty: FieldType,
    pub optional: bool,
}

impl FieldSpec {
    pub const fn required(ty: FieldType) -> Self {
        Self {
            ty,
            optional: false,
        }
    }

    pub const fn optional(ty: FieldType) -> Self {
        Self { ty, optional: true }
    }
}

impl TryFrom<String> for FieldSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for FieldSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_suffix('?') {
            Some(base) => Ok(FieldSpec::optional(base.trim().parse()?)),
            None => Ok(FieldSpec::required(s.parse()?)),
        }
    }
}

impl From<FieldSpec> for String {
    fn from(value: FieldSpec) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ty.as_str())?;
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Why a piece of evidence does not conform to its schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaMismatch {
    MissingField(String),
    WrongType {
        field: String,
        expected: FieldType,
    },
    UnexpectedField(String),
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMismatch::MissingField(field) => {
                write!(f, "evidence field '{field}' is required but missing")
            }
            SchemaMismatch::WrongType { field, expected } => write!(
                f,
                "evidence field '{field}' should be of type {}",
                expected.as_str()
            ),
            SchemaMismatch::UnexpectedField(field) => {
                write!(f, "evidence field '{field}' is not declared in the schema")
            }
        }
    }
}

/// Named evidence fields and their expected shapes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EvidenceSchema(BTreeMap<String, FieldSpec>);

impl EvidenceSchema {
    pub fn new(fields: BTreeMap<String, FieldSpec>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldSpec> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.0.get(field)
    }

    /// Check that `evidence` has every required field, only declared fields, and the right types.
    ///
    /// An optional field holding `null` counts as absent.
    pub fn conform(&self, evidence: &Map<String, Value>) -> Result<(), SchemaMismatch> {
        for (name, spec) in &self.0 {
            match evidence.get(name) {
                None | Some(Value::Null) if spec.optional => {}
                None => return Err(SchemaMismatch::MissingField(name.clone())),
                Some(value) if !spec.ty.matches(value) => {
                    return Err(SchemaMismatch::WrongType {
                        field: name.clone(),
                        expected: spec.ty,
                    });
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = evidence.keys().find(|k| !self.0.contains_key(*k)) {
            return Err(SchemaMismatch::UnexpectedField(extra.clone()));
        }
        Ok(())
    }
}

impl FromIterator<(String, FieldSpec)> for EvidenceSchema {
    fn from_iter<T: IntoIterator<Item = (String, FieldSpec)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One immutable contract entry. Identity is `rule_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    pub rule_id: String,
    pub priority: Priority,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub evidence_schema: EvidenceSchema,
    /// Built-in validator bound by the contract, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckSpec>,
}
