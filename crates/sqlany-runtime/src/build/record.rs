//! Record of the last successful local build.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlany_core::EnvironmentFingerprint;

/// Stored as JSON next to the local build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Environment the artifact was built for
    pub fingerprint: EnvironmentFingerprint,
    /// When the build finished
    pub built_at: DateTime<Utc>,
    pub configure_command: String,
    pub build_command: String,
}

impl BuildRecord {
    pub fn new(
        fingerprint: EnvironmentFingerprint,
        configure_command: String,
        build_command: String,
    ) -> Self {
        Self {
            fingerprint,
            built_at: Utc::now(),
            configure_command,
            build_command,
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_creates_parent_and_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build/Release/sqlany-build.json");
        let record = BuildRecord::new(
            EnvironmentFingerprint::from_parts("linux", "x64", "16.2.0"),
            "cmake -S . -B build".to_string(),
            "cmake --build build".to_string(),
        );

        record.save(&path).unwrap();
        let loaded = BuildRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sqlany-build.json");
        fs::write(&path, "[]").unwrap();

        let err = BuildRecord::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
