//! Subcommand implementations.

pub mod doctor;
pub mod optimize;
pub mod persona;
pub mod recall;
pub mod validate;

use mnemos_config::{EMBEDDING_FILE, PROJECT_FILE, config_dir};
use std::path::PathBuf;

/// Fill in default config locations for paths not given on the command line.
pub(crate) fn config_paths(
    embedding: Option<PathBuf>,
    project: Option<PathBuf>,
) -> (PathBuf, PathBuf) {
    let dir = config_dir();
    (
        embedding.unwrap_or_else(|| dir.join(EMBEDDING_FILE)),
        project.unwrap_or_else(|| dir.join(PROJECT_FILE)),
    )
}
