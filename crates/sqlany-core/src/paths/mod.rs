//! Path utilities for the driver package.
//!
//! - Package root resolution (explicit → `SQLANY_ROOT` → current directory)
//! - Artifact layout for the three resolution tiers
//!
//! No interactive/terminal I/O here; the CLI handles prompts separately.

mod error;
mod layout;
mod platform;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::PathError;
pub use layout::{
    ArtifactLayout, BUILD_RECORD_FILE, DEFAULT_ARTIFACT_NAME, LOCAL_BUILD_DIR, PREBUILD_DIR,
};
pub use platform::{ROOT_ENV, RootResolution, RootSource, resolve_package_root};
