//! Structured document parsing.
//!
//! Documents are parsed into a format-neutral [`serde_json::Value`] tree so
//! schema checks do not care whether the source was TOML or JSON.

use serde_json::Value;
use std::path::Path;

/// Supported configuration document syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from the file extension. Anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    /// Parse document text. The error string is the parser's own message.
    pub fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            Self::Toml => toml::from_str::<Value>(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toml => f.write_str("TOML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}

/// Follow a dotted path through nested mappings.
///
/// Returns `None` when any segment is absent or an intermediate value is not
/// a mapping.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}
