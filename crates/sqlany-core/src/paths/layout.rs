//! On-disk layout of driver artifacts under the package root.
//!
//! ```text
//! <root>/prebuild/<os>/<arch>/<major>_<minor>/<name>.<ext>
//! <root>/bin64|bin32/<name>_v<major>[_<minor>].<ext>
//! <root>/build/Release/<name>.<ext>
//! ```

use std::path::{Path, PathBuf};

use crate::fingerprint::{EnvironmentFingerprint, OsFamily};

/// Default base name of the driver artifact.
pub const DEFAULT_ARTIFACT_NAME: &str = "sqlanywhere";

/// Directory holding version-and-architecture specific prebuilt artifacts.
pub const PREBUILD_DIR: &str = "prebuild";

/// Output directory of a local build, relative to the package root.
pub const LOCAL_BUILD_DIR: [&str; 2] = ["build", "Release"];

/// File name of the build record written next to the local build output.
pub const BUILD_RECORD_FILE: &str = "sqlany-build.json";

/// Where artifacts live and what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
    artifact_name: String,
    extension: Option<String>,
}

impl ArtifactLayout {
    /// Layout rooted at `root` using the default artifact name and the
    /// platform library extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            extension: None,
        }
    }

    #[must_use]
    pub fn with_artifact_name(mut self, name: impl Into<String>) -> Self {
        self.artifact_name = name.into();
        self
    }

    /// Force a file extension instead of the one implied by the OS family.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let ext = extension.into();
        self.extension = Some(ext.trim_start_matches('.').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_name(&self) -> &str {
        &self.artifact_name
    }

    /// Extension for artifacts targeting `os`, if one is known.
    pub fn extension_for(&self, os: &OsFamily) -> Option<String> {
        self.extension
            .clone()
            .or_else(|| os.library_extension().map(str::to_string))
    }

    /// `<root>/prebuild/<os>/<arch>/<major>_<minor>/<name>.<ext>`
    pub fn versioned_prebuilt(&self, fp: &EnvironmentFingerprint) -> Option<PathBuf> {
        let (major, minor) = fp.runtime.major_minor()?;
        if !fp.arch.is_supported() {
            return None;
        }
        let ext = self.extension_for(&fp.os)?;
        Some(
            self.root
                .join(PREBUILD_DIR)
                .join(fp.os.as_str())
                .join(fp.arch.as_str())
                .join(format!("{major}_{minor}"))
                .join(format!("{}.{ext}", self.artifact_name)),
        )
    }

    /// `<root>/bin64|bin32/<name>_v<major>[_<minor>].<ext>`
    ///
    /// The minor version is part of the file name only for runtime major 0.
    pub fn arch_prebuilt(&self, fp: &EnvironmentFingerprint) -> Option<PathBuf> {
        let (major, minor) = fp.runtime.major_minor()?;
        let bin_dir = fp.arch.legacy_bin_dir()?;
        let ext = self.extension_for(&fp.os)?;
        let mut file_name = format!("{}_v{major}", self.artifact_name);
        if major == 0 {
            file_name.push_str(&format!("_{minor}"));
        }
        Some(self.root.join(bin_dir).join(format!("{file_name}.{ext}")))
    }

    /// Directory written by the local build.
    pub fn local_build_dir(&self) -> PathBuf {
        LOCAL_BUILD_DIR
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// `<root>/build/Release/<name>.<ext>`
    pub fn local_build_output(&self, os: &OsFamily) -> Option<PathBuf> {
        let ext = self.extension_for(os)?;
        Some(
            self.local_build_dir()
                .join(format!("{}.{ext}", self.artifact_name)),
        )
    }

    /// Build record stored alongside the local build output.
    pub fn build_record_path(&self) -> PathBuf {
        self.local_build_dir().join(BUILD_RECORD_FILE)
    }
}
