//! Collect-all validation of configuration documents against a [`Schema`].
//!
//! Every required field is checked independently and all violations are
//! returned together, so a user can fix a config in one pass. Syntax errors
//! are reported as a single structural violation, separately from content
//! problems. The validator never fills in defaults.

use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::document::{DocumentFormat, lookup};
use crate::schema::{FieldSpec, FieldType, Schema, type_name};

/// A single problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The document could not be read or parsed at all.
    Syntax { message: String },

    /// A required field is absent.
    Missing { field: String, expected: FieldType },

    /// A required field is present with the wrong type.
    WrongType {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    /// A field is well-typed but its value is unusable.
    Constraint { field: String, reason: String },

    /// The document parsed and passed every check but still does not fit
    /// the typed configuration.
    Unusable { message: String },
}

impl Violation {
    /// Whether this is a structural (syntax) problem rather than a content one.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// The offending field path, if the violation concerns one field.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Syntax { .. } | Self::Unusable { .. } => None,
            Self::Missing { field, .. }
            | Self::WrongType { field, .. }
            | Self::Constraint { field, .. } => Some(field),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax { message } => write!(f, "malformed document: {message}"),
            Self::Missing { field, expected } => {
                write!(f, "missing required field `{field}` (expected {expected})")
            }
            Self::WrongType {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` must be a {expected}, found {found}"),
            Self::Constraint { field, reason } => write!(f, "field `{field}` {reason}"),
            Self::Unusable { message } => write!(f, "unusable content: {message}"),
        }
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationResult {
    Valid,
    Invalid {
        reason: String,
        problems: Vec<Violation>,
    },
}

impl ConfigValidationResult {
    /// Build a result from collected problems; empty means valid.
    pub fn from_problems(schema: &Schema, problems: Vec<Violation>) -> Self {
        if problems.is_empty() {
            return Self::Valid;
        }
        let reason = if problems.iter().any(Violation::is_structural) {
            format!("{} could not be parsed", schema.name())
        } else {
            format!("{} has {} problem(s)", schema.name(), problems.len())
        };
        Self::Invalid { reason, problems }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn problems(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid { problems, .. } => problems,
        }
    }

    pub fn into_problems(self) -> Vec<Violation> {
        match self {
            Self::Valid => vec![],
            Self::Invalid { problems, .. } => problems,
        }
    }
}

/// Validate a parsed document against a schema.
pub fn validate(document: &Value, schema: &Schema) -> ConfigValidationResult {
    if !document.is_object() {
        let problem = Violation::Syntax {
            message: format!("document root must be a mapping, found {}", type_name(document)),
        };
        return ConfigValidationResult::from_problems(schema, vec![problem]);
    }

    let problems: Vec<Violation> = schema
        .fields()
        .iter()
        .filter_map(|field| check_field(document, field))
        .collect();

    debug!(
        schema = schema.name(),
        fields = schema.fields().len(),
        problems = problems.len(),
        "Config document validated"
    );

    ConfigValidationResult::from_problems(schema, problems)
}

/// Parse document text, then validate it.
pub fn validate_str(text: &str, format: DocumentFormat, schema: &Schema) -> ConfigValidationResult {
    match format.parse(text) {
        Ok(document) => validate(&document, schema),
        Err(message) => ConfigValidationResult::from_problems(
            schema,
            vec![Violation::Syntax {
                message: format!("invalid {format}: {message}"),
            }],
        ),
    }
}

/// Read and parse a document file. The format follows the extension.
pub fn read_document(path: &Path) -> Result<Value, Violation> {
    let text = std::fs::read_to_string(path).map_err(|e| Violation::Syntax {
        message: format!("cannot read {}: {e}", path.display()),
    })?;
    let format = DocumentFormat::from_path(path);
    format.parse(&text).map_err(|message| Violation::Syntax {
        message: format!("invalid {format}: {message}"),
    })
}

/// Read, parse, and validate a document file.
pub fn validate_file(path: &Path, schema: &Schema) -> ConfigValidationResult {
    match read_document(path) {
        Ok(document) => validate(&document, schema),
        Err(violation) => ConfigValidationResult::from_problems(schema, vec![violation]),
    }
}

fn check_field(document: &Value, field: &FieldSpec) -> Option<Violation> {
    match lookup(document, &field.path) {
        None => Some(Violation::Missing {
            field: field.path.clone(),
            expected: field.kind,
        }),
        Some(value) if !field.kind.matches(value) => Some(Violation::WrongType {
            field: field.path.clone(),
            expected: field.kind,
            found: type_name(value),
        }),
        Some(_) => None,
    }
}
