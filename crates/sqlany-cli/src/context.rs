//! Per-invocation context: package root and effective configuration.

use anyhow::{Context, Result};
use sqlany_core::{EnvironmentFingerprint, LoaderConfig, RootResolution, resolve_package_root};
use tracing::debug;

use crate::parser::Cli;

/// Everything a handler needs, resolved once from flags and environment.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub root: RootResolution,
    pub config: LoaderConfig,
}

impl CliContext {
    /// Resolve the package root, load its configuration and apply CLI flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = resolve_package_root(cli.root.as_deref())
            .context("Failed to resolve package root")?;
        debug!(root = %root.path.display(), source = root.source.describe(), "Resolved package root");

        let mut config = LoaderConfig::load(&root.path)
            .with_context(|| format!("Failed to load configuration for {}", root.path.display()))?;
        if let Some(version) = &cli.runtime_version {
            config.runtime_version = Some(version.clone());
        }

        Ok(Self { root, config })
    }

    pub fn fingerprint(&self) -> EnvironmentFingerprint {
        self.config.fingerprint()
    }

    /// `"<path> (from <source>)"`, for headers.
    pub fn root_label(&self) -> String {
        format!(
            "{} (from {})",
            self.root.path.display(),
            self.root.source.describe()
        )
    }
}
