//! Core types for locating the SQL Anywhere native driver.
//!
//! - [`fingerprint`]: identity of the running process (OS, arch, runtime version)
//! - [`paths`]: package root resolution and the on-disk artifact layout
//! - [`config`]: layered loader configuration
//!
//! Nothing in this crate loads libraries or spawns processes; that lives in
//! `sqlany-runtime`.

pub mod config;
pub mod fingerprint;
pub mod paths;

pub use config::{CommandSpec, ConfigError, LoaderConfig, LoaderSettings};
pub use fingerprint::{CpuArch, EnvironmentFingerprint, OsFamily, RuntimeVersion, fingerprint};
pub use paths::{ArtifactLayout, PathError, RootResolution, RootSource, resolve_package_root};
