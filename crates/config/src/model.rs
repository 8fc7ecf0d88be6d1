//! Typed embedding and project configuration.
//!
//! Documents are validated against their schema and semantic constraints;
//! only a document with no violations is deserialized into these structs.
//! Optional fields may have defaults, required ones never do.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ConfigError;
use crate::document::lookup;
use crate::schema::{FieldType, Schema};
use crate::validate::{ConfigValidationResult, Violation, read_document, validate};

/// Connection settings for the external embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name (e.g., "openai", "ollama")
    pub provider: String,

    /// Embedding endpoint URL
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Model identifier
    pub model: String,

    /// Vector dimensionality produced by the model
    pub dimensions: usize,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    32
}

impl EmbeddingConfig {
    /// Resolve the credential from the environment variable named in the config.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Project identity, storage layout, and feature flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,

    pub storage: StorageConfig,

    /// Named boolean feature flags
    pub features: BTreeMap<String, bool>,

    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub memory_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum optimized query length, in characters
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    /// Persona file loaded into the pipeline at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<PathBuf>,
}

fn default_max_query_length() -> usize {
    mnemos_core::query::MAX_LENGTH
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_query_length: default_max_query_length(),
            persona_file: None,
        }
    }
}

impl ProjectConfig {
    /// Whether a feature flag is set. Unknown flags are off.
    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

/// A configuration document kind: its schema plus semantic checks on the
/// values the schema cannot express.
pub trait ConfigDocument: DeserializeOwned {
    fn schema() -> Schema;

    fn constraints(document: &Value) -> Vec<Violation>;

    /// Validate and deserialize a document file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let schema = Self::schema();
        let config = inspect::<Self>(path, &schema).map_err(|problems| ConfigError::Invalid {
            path: path.to_path_buf(),
            problems,
        })?;
        info!(file = %path.display(), schema = schema.name(), "Configuration loaded");
        Ok(config)
    }

    /// Run the same checks as [`ConfigDocument::load`] and report the outcome
    /// instead of the typed config.
    fn check(path: &Path) -> ConfigValidationResult {
        let schema = Self::schema();
        let problems = inspect::<Self>(path, &schema).err().unwrap_or_default();
        ConfigValidationResult::from_problems(&schema, problems)
    }

    /// Schema violations plus every semantic violation on a field the schema
    /// pass did not already flag.
    fn problems(document: &Value, schema: &Schema) -> Vec<Violation> {
        let mut problems = validate(document, schema).into_problems();
        if problems.iter().any(Violation::is_structural) {
            return problems;
        }

        let flagged: HashSet<String> = problems
            .iter()
            .filter_map(Violation::field)
            .map(str::to_owned)
            .collect();
        problems.extend(
            Self::constraints(document)
                .into_iter()
                .filter(|p| p.field().is_none_or(|field| !flagged.contains(field))),
        );
        problems
    }
}

fn inspect<T: ConfigDocument>(path: &Path, schema: &Schema) -> Result<T, Vec<Violation>> {
    let document = read_document(path).map_err(|v| vec![v])?;
    let problems = T::problems(&document, schema);
    if !problems.is_empty() {
        return Err(problems);
    }
    serde_json::from_value(document).map_err(|e| {
        vec![Violation::Unusable {
            message: e.to_string(),
        }]
    })
}

impl ConfigDocument for EmbeddingConfig {
    fn schema() -> Schema {
        Schema::embedding()
    }

    fn constraints(document: &Value) -> Vec<Violation> {
        let mut problems = Vec::new();

        if let Some(endpoint) = lookup(document, "endpoint").and_then(Value::as_str)
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            problems.push(Violation::Constraint {
                field: "endpoint".into(),
                reason: format!("must be an http(s) URL, got `{endpoint}`"),
            });
        }

        for field in ["provider", "api_key_env", "model"] {
            if lookup(document, field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim().is_empty())
            {
                problems.push(Violation::Constraint {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
        }

        check_positive_integer(document, "dimensions", &mut problems);
        check_positive_integer(document, "batch_size", &mut problems);

        problems
    }
}

impl ConfigDocument for ProjectConfig {
    fn schema() -> Schema {
        Schema::project()
    }

    fn constraints(document: &Value) -> Vec<Violation> {
        let mut problems = Vec::new();

        for field in ["name", "storage.data_dir", "storage.memory_dir"] {
            if lookup(document, field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim().is_empty())
            {
                problems.push(Violation::Constraint {
                    field: field.into(),
                    reason: "must not be empty".into(),
                });
            }
        }

        if let Some(features) = lookup(document, "features").and_then(Value::as_object) {
            for (flag, value) in features {
                if !value.is_boolean() {
                    problems.push(Violation::Constraint {
                        field: format!("features.{flag}"),
                        reason: format!(
                            "must be a boolean flag, found {}",
                            crate::schema::type_name(value)
                        ),
                    });
                }
            }
        }

        if let Some(memory) = lookup(document, "memory")
            && !memory.is_object()
        {
            problems.push(Violation::WrongType {
                field: "memory".into(),
                expected: FieldType::Mapping,
                found: crate::schema::type_name(memory),
            });
        }

        check_positive_integer(document, "memory.max_query_length", &mut problems);

        if let Some(persona) = lookup(document, "memory.persona_file")
            && !persona.is_string()
        {
            problems.push(Violation::Constraint {
                field: "memory.persona_file".into(),
                reason: format!("must be a path string, found {}", crate::schema::type_name(persona)),
            });
        }

        problems
    }
}

/// Absent is fine; present must be a whole number above zero.
fn check_positive_integer(document: &Value, field: &str, problems: &mut Vec<Violation>) {
    let Some(value) = lookup(document, field) else {
        return;
    };
    if !value.as_u64().is_some_and(|n| n > 0) {
        problems.push(Violation::Constraint {
            field: field.into(),
            reason: format!("must be a positive integer, got {value}"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EMBEDDING_TOML: &str = r#"
provider = "openai"
endpoint = "https://api.openai.com/v1/embeddings"
api_key_env = "MNEMOS_TEST_EMBEDDING_KEY"
model = "text-embedding-3-small"
dimensions = 1536
"#;

    const PROJECT_TOML: &str = r#"
name = "companion"

[storage]
data_dir = "/var/lib/companion"
memory_dir = "/var/lib/companion/memory"

[features]
long_term_memory = true
voice = false

[memory]
max_query_length = 500
persona_file = "persona.md"
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_embedding_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "embedding.toml", EMBEDDING_TOML);
        let config = EmbeddingConfig::load(&path).unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.dimensions, 1536);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn load_project_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "project.toml", PROJECT_TOML);
        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.name, "companion");
        assert!(config.feature("long_term_memory"));
        assert!(!config.feature("voice"));
        assert!(!config.feature("unknown"));
        assert_eq!(config.memory.max_query_length, 500);
        assert_eq!(config.memory.persona_file, Some(PathBuf::from("persona.md")));
    }

    #[test]
    fn project_memory_section_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "project.json",
            r#"{"name": "p", "storage": {"data_dir": "d", "memory_dir": "m"}, "features": {}}"#,
        );
        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.memory, MemoryConfig::default());
    }

    #[test]
    fn schema_violations_block_loading() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "embedding.toml", "provider = \"openai\"\ndimensions = \"big\"\n");
        let err = EmbeddingConfig::load(&path).unwrap_err();
        match err {
            ConfigError::Invalid { problems, .. } => assert_eq!(problems.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn semantic_constraints_are_collected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "embedding.toml",
            r#"
provider = "openai"
endpoint = "api.openai.com"
api_key_env = ""
model = "m"
dimensions = 0
"#,
        );
        let err = EmbeddingConfig::load(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("endpoint"));
        assert!(message.contains("api_key_env"));
        assert!(message.contains("dimensions"));

        let result = EmbeddingConfig::check(&path);
        assert_eq!(result.problems().len(), 3);
    }

    #[test]
    fn constraints_reported_alongside_missing_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "embedding.toml",
            r#"
provider = "openai"
endpoint = "ftp://x"
api_key_env = "KEY"
dimensions = 0
"#,
        );
        let result = EmbeddingConfig::check(&path);
        let problems = result.problems();
        assert_eq!(problems.len(), 3);
        assert!(matches!(&problems[0], Violation::Missing { field, .. } if field == "model"));
        assert!(problems.iter().any(|p| p.field() == Some("endpoint")));
        assert!(problems.iter().any(|p| p.field() == Some("dimensions")));
    }

    #[test]
    fn wrong_typed_field_reported_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "embedding.toml",
            r#"
provider = "openai"
endpoint = "https://example.com"
api_key_env = "KEY"
model = "m"
dimensions = "1536"
"#,
        );
        let problems = EmbeddingConfig::check(&path).into_problems();
        assert_eq!(problems.len(), 1);
        assert!(matches!(&problems[0], Violation::WrongType { field, .. } if field == "dimensions"));
    }

    #[test]
    fn check_and_load_agree_on_scalar_memory_section() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            "project.toml",
            r#"
name = "p"
memory = 5

[storage]
data_dir = "d"
memory_dir = "m"

[features]
"#,
        );

        let checked = ProjectConfig::check(&path).into_problems();
        let loaded = match ProjectConfig::load(&path).unwrap_err() {
            ConfigError::Invalid { problems, .. } => problems,
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(checked, loaded);
        assert_eq!(checked.len(), 1);
        assert!(!checked[0].is_structural());
        assert!(matches!(&checked[0], Violation::WrongType { field, .. } if field == "memory"));
    }

    #[test]
    fn fractional_dimensions_rejected() {
        let doc = serde_json::json!({"dimensions": 768.5});
        let problems = EmbeddingConfig::constraints(&doc);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field(), Some("dimensions"));
    }

    #[test]
    fn non_boolean_feature_flag_rejected() {
        let doc = serde_json::json!({
            "name": "p",
            "storage": {"data_dir": "d", "memory_dir": "m"},
            "features": {"beta": "on"}
        });
        let problems = ProjectConfig::constraints(&doc);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field(), Some("features.beta"));
    }

    #[test]
    fn api_key_resolved_from_named_env_var() {
        let config = EmbeddingConfig {
            provider: "openai".into(),
            endpoint: "https://example.com".into(),
            api_key_env: "MNEMOS_TEST_SURELY_UNSET_VAR".into(),
            model: "m".into(),
            dimensions: 8,
            batch_size: 1,
        };
        assert_eq!(config.api_key(), None);
    }
}
