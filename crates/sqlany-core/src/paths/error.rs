//! Package root errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    /// `~` was used but there is no home directory to expand it to.
    #[error("Cannot expand '~': home directory is unknown")]
    NoHomeDir,

    #[error("Package root {0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("Package root path cannot be empty")]
    EmptyPath,

    #[error("Cannot determine current directory for the package root: {0}")]
    CurrentDirError(String),
}
