//! Configuration validation and loading for Mnemos.
//!
//! Two documents drive the memory pipeline: the embedding config
//! (`~/.mnemos/embedding.toml`) and the project config
//! (`~/.mnemos/project.toml`). Both are validated against declarative
//! schemas before anything else starts, and every problem in both documents
//! is reported in one go.

pub mod document;
pub mod model;
pub mod schema;
pub mod validate;

pub use document::DocumentFormat;
pub use model::{ConfigDocument, EmbeddingConfig, MemoryConfig, ProjectConfig, StorageConfig};
pub use schema::{FieldSpec, FieldType, Schema, SchemaError};
pub use validate::{ConfigValidationResult, Violation, validate, validate_file, validate_str};

use std::path::{Path, PathBuf};

pub const EMBEDDING_FILE: &str = "embedding.toml";
pub const PROJECT_FILE: &str = "project.toml";

/// Both configuration documents, validated.
///
/// The only way to build one is [`StartupConfig::load`] (or its default-path
/// variant), so holding a `StartupConfig` proves validation already ran.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    embedding: EmbeddingConfig,
    project: ProjectConfig,
    project_dir: PathBuf,
}

impl StartupConfig {
    /// Validate and load both documents, reporting problems from both together.
    pub fn load(embedding_path: &Path, project_path: &Path) -> Result<Self, ConfigError> {
        let embedding = EmbeddingConfig::load(embedding_path);
        let project = ProjectConfig::load(project_path);

        match (embedding, project) {
            (Ok(embedding), Ok(project)) => {
                let project_dir = project_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Ok(Self {
                    embedding,
                    project,
                    project_dir,
                })
            }
            (embedding, project) => {
                let failures: Vec<ConfigError> =
                    [embedding.err(), project.err()].into_iter().flatten().collect();
                tracing::warn!(documents = failures.len(), "Startup configuration rejected");
                Err(ConfigError::Startup { failures })
            }
        }
    }

    /// Load both documents from [`config_dir`].
    pub fn load_default() -> Result<Self, ConfigError> {
        let dir = config_dir();
        Self::load(&dir.join(EMBEDDING_FILE), &dir.join(PROJECT_FILE))
    }

    pub fn embedding(&self) -> &EmbeddingConfig {
        &self.embedding
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// The persona file, resolved against the project config's directory.
    pub fn persona_path(&self) -> Option<PathBuf> {
        self.project
            .memory
            .persona_file
            .as_ref()
            .map(|p| self.project_dir.join(p))
    }
}

/// Validate a document against a schema read from disk.
///
/// Problems in the document come back in the result. A schema file that
/// cannot be read or declares a malformed schema is an error.
pub fn validate_with_schema_file(
    document: &Path,
    schema: &Path,
) -> Result<ConfigValidationResult, ConfigError> {
    let schema = Schema::from_file(schema)?;
    Ok(validate_file(document, &schema))
}

/// Get the configuration directory: `$MNEMOS_CONFIG_DIR`, else `~/.mnemos`.
pub fn config_dir() -> PathBuf {
    match std::env::var("MNEMOS_CONFIG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs_home().join(".mnemos"),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{} is invalid:\n{}", path.display(), format_problems(problems))]
    Invalid {
        path: PathBuf,
        problems: Vec<Violation>,
    },

    #[error("Startup configuration invalid:\n{}", format_failures(failures))]
    Startup { failures: Vec<ConfigError> },

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),
}

impl ConfigError {
    /// Every violation carried by this error, across documents.
    pub fn problems(&self) -> Vec<&Violation> {
        match self {
            Self::Invalid { problems, .. } => problems.iter().collect(),
            Self::Startup { failures } => failures.iter().flat_map(|f| f.problems()).collect(),
            Self::Schema(_) => vec![],
        }
    }
}

fn format_problems(problems: &[Violation]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_failures(failures: &[ConfigError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EMBEDDING_TOML: &str = r#"
provider = "ollama"
endpoint = "http://localhost:11434/api/embeddings"
api_key_env = "OLLAMA_API_KEY"
model = "nomic-embed-text"
dimensions = 768
"#;

    const PROJECT_TOML: &str = r#"
name = "companion"

[storage]
data_dir = "data"
memory_dir = "data/memory"

[features]
long_term_memory = true

[memory]
persona_file = "persona.md"
"#;

    #[test]
    fn startup_loads_both_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let embedding = tmp.path().join(EMBEDDING_FILE);
        let project = tmp.path().join(PROJECT_FILE);
        fs::write(&embedding, EMBEDDING_TOML).unwrap();
        fs::write(&project, PROJECT_TOML).unwrap();

        let startup = StartupConfig::load(&embedding, &project).unwrap();
        assert_eq!(startup.embedding().dimensions, 768);
        assert_eq!(startup.project().name, "companion");
        assert_eq!(startup.persona_path(), Some(tmp.path().join("persona.md")));
    }

    #[test]
    fn startup_reports_problems_from_both_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let embedding = tmp.path().join(EMBEDDING_FILE);
        let project = tmp.path().join(PROJECT_FILE);
        fs::write(&embedding, "provider = \"ollama\"\n").unwrap();
        fs::write(&project, "name = [").unwrap();

        let err = StartupConfig::load(&embedding, &project).unwrap_err();
        let problems = err.problems();
        // four missing embedding fields, one project syntax error
        assert_eq!(problems.len(), 5);
        assert_eq!(problems.iter().filter(|p| p.is_structural()).count(), 1);

        let message = err.to_string();
        assert!(message.contains("missing required field `endpoint`"));
        assert!(message.contains("malformed document"));
    }

    #[test]
    fn missing_files_are_reported_not_defaulted() {
        let err = StartupConfig::load(
            Path::new("/nonexistent/embedding.toml"),
            Path::new("/nonexistent/project.toml"),
        )
        .unwrap_err();
        assert_eq!(err.problems().len(), 2);
        assert!(err.problems().iter().all(|p| p.is_structural()));
    }

    #[test]
    fn invalid_error_lists_each_problem() {
        let err = ConfigError::Invalid {
            path: PathBuf::from("embedding.toml"),
            problems: vec![
                Violation::Missing {
                    field: "model".into(),
                    expected: FieldType::String,
                },
                Violation::Constraint {
                    field: "dimensions".into(),
                    reason: "must be a positive integer, got 0".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "embedding.toml is invalid:\n  - missing required field `model` (expected string)\n  - field `dimensions` must be a positive integer, got 0"
        );
    }

    #[test]
    fn custom_schema_file_validates_document() {
        let tmp = tempfile::tempdir().unwrap();
        let schema = tmp.path().join("schema.toml");
        let document = tmp.path().join("doc.json");
        fs::write(
            &schema,
            "name = \"retention\"\n\n[[fields]]\npath = \"days\"\ntype = \"number\"\n\n[[fields]]\npath = \"policy.mode\"\ntype = \"string\"\n",
        )
        .unwrap();
        fs::write(&document, r#"{"days": "thirty", "policy": {}}"#).unwrap();

        let result = validate_with_schema_file(&document, &schema).unwrap();
        assert_eq!(result.problems().len(), 2);
        assert!(!result.is_valid());
    }

    #[test]
    fn malformed_schema_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let schema = tmp.path().join("schema.json");
        let document = tmp.path().join("doc.toml");
        fs::write(
            &schema,
            r#"{"name": "dup", "fields": [{"path": "a", "type": "string"}, {"path": "a", "type": "number"}]}"#,
        )
        .unwrap();
        fs::write(&document, "a = \"x\"\n").unwrap();

        let err = validate_with_schema_file(&document, &schema).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::DuplicateField { .. })));
        assert!(err.problems().is_empty());

        let err = validate_with_schema_file(&document, &tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(SchemaError::Unreadable { .. })));
    }

    #[test]
    fn config_dir_ends_with_mnemos_by_default() {
        if std::env::var("MNEMOS_CONFIG_DIR").is_err() {
            assert!(config_dir().ends_with(".mnemos"));
        }
    }
}
