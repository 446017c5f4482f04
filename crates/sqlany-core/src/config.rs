//! Loader configuration.
//!
//! Settings are layered: built-in defaults, then an optional
//! `sqlany-loader.json` in the package root, then `SQLANY_*` environment
//! variables. Adapters apply their own overrides (CLI flags) last.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fingerprint::{EnvironmentFingerprint, RuntimeVersion, fingerprint};
use crate::paths::{ArtifactLayout, DEFAULT_ARTIFACT_NAME, LOCAL_BUILD_DIR};

/// Configuration file looked up in the package root.
pub const CONFIG_FILE: &str = "sqlany-loader.json";

pub const ARTIFACT_NAME_ENV: &str = "SQLANY_ARTIFACT_NAME";
pub const ARTIFACT_EXT_ENV: &str = "SQLANY_ARTIFACT_EXT";
pub const CONFIGURE_COMMAND_ENV: &str = "SQLANY_CONFIGURE_COMMAND";
pub const BUILD_COMMAND_ENV: &str = "SQLANY_BUILD_COMMAND";
pub const SMOKE_TEST_ENV: &str = "SQLANY_SMOKE_TEST";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{var} is set but empty")]
    EmptyCommand { var: &'static str },

    #[error("{var} must be one of 1/0/true/false/yes/no/on/off, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

/// An external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a whitespace-separated command line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Settings persisted in `sqlany-loader.json`.
///
/// All fields are optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderSettings {
    pub artifact_name: Option<String>,
    pub artifact_extension: Option<String>,
    pub configure_command: Option<CommandSpec>,
    pub build_command: Option<CommandSpec>,
    pub smoke_test: Option<bool>,
}

/// Effective configuration for one package root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub root: PathBuf,
    pub artifact_name: String,
    pub artifact_extension: Option<String>,
    pub configure_command: CommandSpec,
    pub build_command: CommandSpec,
    /// Create and discard a connection after loading.
    pub smoke_test: bool,
    /// Replaces the detected runtime version when set.
    pub runtime_version: Option<String>,
}

impl LoaderConfig {
    /// Built-in defaults for a package root: CMake configure and build
    /// writing into `build/Release`.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output_dir = LOCAL_BUILD_DIR
            .iter()
            .fold(root.clone(), |path, part| path.join(part));
        let output_dir = output_dir.display().to_string();

        Self {
            configure_command: CommandSpec::new(
                "cmake",
                [
                    "-S".to_string(),
                    ".".to_string(),
                    "-B".to_string(),
                    "build".to_string(),
                    "-DCMAKE_BUILD_TYPE=Release".to_string(),
                    // No `lib` prefix, so Unix builds land on the tier-3 name.
                    "-DCMAKE_SHARED_LIBRARY_PREFIX=".to_string(),
                    "-DCMAKE_SHARED_MODULE_PREFIX=".to_string(),
                    // Per-config variables stop multi-config generators from
                    // appending another `Release/`.
                    format!("-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_RELEASE={output_dir}"),
                    format!("-DCMAKE_RUNTIME_OUTPUT_DIRECTORY_RELEASE={output_dir}"),
                ],
            ),
            build_command: CommandSpec::new("cmake", ["--build", "build", "--config", "Release"]),
            root,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            artifact_extension: None,
            smoke_test: true,
            runtime_version: None,
        }
    }

    /// Defaults, then `sqlany-loader.json` (if present), then environment.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::with_defaults(root);
        let file = config.root.join(CONFIG_FILE);
        if file.is_file() {
            let settings = LoaderSettings::load(&file)?;
            debug!(path = %file.display(), "Applying loader settings file");
            config.apply(settings);
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay settings; `None` fields leave the current value alone.
    pub fn apply(&mut self, settings: LoaderSettings) {
        if let Some(name) = settings.artifact_name {
            self.artifact_name = name;
        }
        if let Some(ext) = settings.artifact_extension {
            self.artifact_extension = Some(ext);
        }
        if let Some(cmd) = settings.configure_command {
            self.configure_command = cmd;
        }
        if let Some(cmd) = settings.build_command {
            self.build_command = cmd;
        }
        if let Some(smoke) = settings.smoke_test {
            self.smoke_test = smoke;
        }
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        let settings = LoaderSettings {
            artifact_name: non_empty_var(ARTIFACT_NAME_ENV),
            artifact_extension: non_empty_var(ARTIFACT_EXT_ENV),
            configure_command: command_var(CONFIGURE_COMMAND_ENV)?,
            build_command: command_var(BUILD_COMMAND_ENV)?,
            smoke_test: flag_var(SMOKE_TEST_ENV)?,
        };
        self.apply(settings);
        Ok(())
    }

    /// Fingerprint of the running environment, honoring `runtime_version`.
    pub fn fingerprint(&self) -> EnvironmentFingerprint {
        let mut fp = fingerprint();
        if let Some(version) = &self.runtime_version {
            fp.runtime = RuntimeVersion::parse(version);
        }
        fp
    }

    /// Artifact layout described by this configuration.
    pub fn layout(&self) -> ArtifactLayout {
        let layout = ArtifactLayout::new(&self.root).with_artifact_name(&self.artifact_name);
        match &self.artifact_extension {
            Some(ext) => layout.with_extension(ext),
            None => layout,
        }
    }
}

impl LoaderSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn command_var(var: &'static str) -> Result<Option<CommandSpec>, ConfigError> {
    match env::var(var) {
        Ok(value) => CommandSpec::parse(&value)
            .map(Some)
            .ok_or(ConfigError::EmptyCommand { var }),
        Err(_) => Ok(None),
    }
}

fn flag_var(var: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(value) = non_empty_var(var) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidFlag { var, value }),
    }
}
