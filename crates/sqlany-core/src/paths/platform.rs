//! Package root resolution.
//!
//! The package root is the directory holding `prebuild/`, `bin64/`, `bin32/`
//! and `build/`. It is also the working directory of the build pipeline.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable naming the package root.
pub const ROOT_ENV: &str = "SQLANY_ROOT";

/// How the package root was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    /// The caller passed an explicit path (e.g., CLI flag).
    Explicit,
    /// The path came from `SQLANY_ROOT` / `.env`.
    EnvVar,
    /// Fallback to the current working directory.
    CurrentDir,
}

impl RootSource {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::EnvVar => ROOT_ENV,
            Self::CurrentDir => "current directory",
        }
    }
}

/// Resolution result for the package root.
#[derive(Debug, Clone)]
pub struct RootResolution {
    /// The resolved, absolute package root.
    pub path: PathBuf,
    /// How the path was determined.
    pub source: RootSource,
}

/// Resolve the package root from an explicit override, env var, or the
/// current directory.
///
/// Resolution order:
/// 1. Explicit path provided by caller (highest priority)
/// 2. `SQLANY_ROOT` environment variable
/// 3. Current working directory
pub fn resolve_package_root(explicit: Option<&str>) -> Result<RootResolution, PathError> {
    if let Some(path_str) = explicit {
        return checked(normalize_user_path(path_str)?, RootSource::Explicit);
    }

    if let Ok(env_path) = env::var(ROOT_ENV) {
        if !env_path.trim().is_empty() {
            return checked(normalize_user_path(&env_path)?, RootSource::EnvVar);
        }
    }

    let cwd = env::current_dir().map_err(|e| PathError::CurrentDirError(e.to_string()))?;
    checked(cwd, RootSource::CurrentDir)
}

fn checked(path: PathBuf, source: RootSource) -> Result<RootResolution, PathError> {
    if path.exists() && !path.is_dir() {
        return Err(PathError::NotADirectory(path));
    }
    Ok(RootResolution { path, source })
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub(super) fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}
