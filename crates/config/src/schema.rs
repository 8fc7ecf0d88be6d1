//! Declarative schemas for configuration documents.
//!
//! A schema is data: a name plus a list of required fields, each identified by
//! a dotted key path (`storage.data_dir`) and an expected value type. Schemas
//! can be built in code, parsed from TOML/JSON, or taken from the built-in
//! defaults for the embedding and project documents.
//!
//! A schema is checked once, at construction. A malformed schema is a
//! deployment fault and surfaces as [`SchemaError`], never as a validation
//! problem in the document being checked.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::document::DocumentFormat;

/// The value types a required field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Mapping,
}

impl FieldType {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Mapping => value.is_object(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Mapping => "mapping",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the type a document value actually has, for diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

/// One required field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Dotted key path from the document root.
    pub path: String,

    #[serde(rename = "type")]
    pub kind: FieldType,
}

impl FieldSpec {
    pub fn new(path: impl Into<String>, kind: FieldType) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

/// A validated set of required fields for one document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

#[derive(Deserialize)]
struct RawSchema {
    name: String,
    #[serde(default)]
    fields: Vec<FieldSpec>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        Schema::new(raw.name, raw.fields)
    }
}

impl Schema {
    /// Build a schema, rejecting empty paths, duplicates, and fields nested
    /// under a field that is not declared as a mapping.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut seen = HashSet::new();

        for field in &fields {
            if field.path.trim().is_empty() {
                return Err(SchemaError::EmptyPath { schema: name });
            }
            if field.segments().any(|s| s.trim().is_empty()) {
                return Err(SchemaError::EmptySegment {
                    schema: name,
                    path: field.path.clone(),
                });
            }
            if !seen.insert(field.path.as_str()) {
                return Err(SchemaError::DuplicateField {
                    schema: name,
                    path: field.path.clone(),
                });
            }
        }

        for parent in &fields {
            if parent.kind == FieldType::Mapping {
                continue;
            }
            let prefix = format!("{}.", parent.path);
            if let Some(child) = fields.iter().find(|f| f.path.starts_with(&prefix)) {
                return Err(SchemaError::NestedUnderScalar {
                    schema: name,
                    parent: parent.path.clone(),
                    child: child.path.clone(),
                });
            }
        }

        Ok(Self { name, fields })
    }

    /// Parse a schema from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        toml::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Parse a schema from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Read a schema file, TOML or JSON by extension.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        match DocumentFormat::from_path(path) {
            DocumentFormat::Toml => Self::from_toml_str(&text),
            DocumentFormat::Json => Self::from_json_str(&text),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Required fields of the embedding configuration.
    pub fn embedding() -> Self {
        Self {
            name: "embedding config".into(),
            fields: vec![
                FieldSpec::new("provider", FieldType::String),
                FieldSpec::new("endpoint", FieldType::String),
                FieldSpec::new("api_key_env", FieldType::String),
                FieldSpec::new("model", FieldType::String),
                FieldSpec::new("dimensions", FieldType::Number),
            ],
        }
    }

    /// Required fields of the project configuration.
    pub fn project() -> Self {
        Self {
            name: "project config".into(),
            fields: vec![
                FieldSpec::new("name", FieldType::String),
                FieldSpec::new("storage", FieldType::Mapping),
                FieldSpec::new("storage.data_dir", FieldType::String),
                FieldSpec::new("storage.memory_dir", FieldType::String),
                FieldSpec::new("features", FieldType::Mapping),
            ],
        }
    }
}

/// A malformed schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema `{schema}` declares a field with an empty path")]
    EmptyPath { schema: String },

    #[error("schema `{schema}` field `{path}` has an empty path segment")]
    EmptySegment { schema: String, path: String },

    #[error("schema `{schema}` declares field `{path}` more than once")]
    DuplicateField { schema: String, path: String },

    #[error("schema `{schema}` nests `{child}` under `{parent}`, which is not a mapping")]
    NestedUnderScalar {
        schema: String,
        parent: String,
        child: String,
    },

    #[error("failed to parse schema: {0}")]
    Parse(String),

    #[error("cannot read schema {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_schemas_are_well_formed() {
        for schema in [Schema::embedding(), Schema::project()] {
            let rebuilt = Schema::new(schema.name(), schema.fields().to_vec()).unwrap();
            assert_eq!(rebuilt, schema);
        }
    }

    #[test]
    fn field_types_match_json_values() {
        assert!(FieldType::String.matches(&json!("x")));
        assert!(FieldType::Number.matches(&json!(3)));
        assert!(FieldType::Number.matches(&json!(0.5)));
        assert!(FieldType::Boolean.matches(&json!(false)));
        assert!(FieldType::Mapping.matches(&json!({})));
        assert!(!FieldType::Mapping.matches(&json!([])));
        assert!(!FieldType::Number.matches(&json!("3")));
        assert_eq!(type_name(&json!([1])), "array");
    }

    #[test]
    fn duplicate_fields_rejected() {
        let err = Schema::new(
            "dup",
            vec![
                FieldSpec::new("a", FieldType::String),
                FieldSpec::new("a", FieldType::Number),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn empty_paths_rejected() {
        let err = Schema::new("e", vec![FieldSpec::new("  ", FieldType::String)]).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyPath { .. }));

        let err = Schema::new("e", vec![FieldSpec::new("a..b", FieldType::String)]).unwrap_err();
        assert!(matches!(err, SchemaError::EmptySegment { .. }));
    }

    #[test]
    fn nesting_under_scalar_rejected() {
        let err = Schema::new(
            "n",
            vec![
                FieldSpec::new("storage", FieldType::String),
                FieldSpec::new("storage.data_dir", FieldType::String),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("storage.data_dir"));
    }

    #[test]
    fn schema_parses_from_toml() {
        let schema = Schema::from_toml_str(
            r#"
name = "custom"

[[fields]]
path = "server.url"
type = "string"

[[fields]]
path = "retries"
type = "number"
"#,
        )
        .unwrap();
        assert_eq!(schema.name(), "custom");
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.fields()[1].kind, FieldType::Number);
    }

    #[test]
    fn malformed_schema_document_is_an_error() {
        let err = Schema::from_json_str(
            r#"{"name": "bad", "fields": [{"path": "x", "type": "date"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));

        let err = Schema::from_json_str(
            r#"{"name": "bad", "fields": [{"path": "x", "type": "string"}, {"path": "x", "type": "string"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
