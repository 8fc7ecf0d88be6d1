//! Error types for the Mnemos domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for Mnemos operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Persona errors ---
    #[error("Persona error: {0}")]
    Persona(#[from] PersonaError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Failures reading a persona file.
///
/// Only surfaced by [`crate::persona::PersonaRecord::try_load`]; the total
/// loader logs these and falls back to an empty record.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Persona file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Permission denied reading persona file: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read persona file {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

impl PersonaError {
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Unreadable {
                path,
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_error_displays_correctly() {
        let err = Error::Memory(MemoryError::QueryFailed("index offline".into()));
        assert!(err.to_string().contains("Memory error"));
        assert!(err.to_string().contains("index offline"));
    }

    #[test]
    fn persona_io_errors_are_classified() {
        let path = std::path::Path::new("/tmp/persona.md");
        let missing = PersonaError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(missing, PersonaError::NotFound { .. }));

        let denied = PersonaError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(denied, PersonaError::PermissionDenied { .. }));

        let other = PersonaError::from_io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
        );
        assert!(other.to_string().contains("valid UTF-8"));
    }
}
