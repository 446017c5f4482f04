//! Environment fingerprinting.
//!
//! A fingerprint identifies the running process by operating system family,
//! CPU architecture and runtime version. It is the lookup key for driver
//! artifacts. Fingerprinting never fails: values outside the supported
//! enumeration are kept as markers so that resolution can reject them with
//! a descriptive error.

use std::env;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the detected runtime version.
pub const RUNTIME_VERSION_ENV: &str = "SQLANY_RUNTIME_VERSION";

/// Runtime version of the host, captured at build time by `build.rs`.
pub const HOST_RUNTIME_VERSION: &str = env!("SQLANY_HOST_RUNTIME_VERSION");

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?([0-9]+)\.([0-9]+)\.([0-9]+)$").expect("version pattern is valid")
});

// ============================================================================
// Operating system
// ============================================================================

/// Operating system family, named the way prebuilt directories are named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    Win32,
    Linux,
    Darwin,
    /// Anything else, with the raw name as reported.
    Unsupported(String),
}

impl OsFamily {
    /// Map an OS name to a family.
    ///
    /// Accepts both `std::env::consts::OS` names (`windows`, `macos`) and the
    /// directory names used by the prebuilt layout (`win32`, `darwin`).
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "win32" | "windows" => Self::Win32,
            "linux" => Self::Linux,
            "darwin" | "macos" => Self::Darwin,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Directory name used under `prebuild/`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Win32 => "win32",
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Unsupported(raw) => raw,
        }
    }

    /// Shared library extension used by artifacts built for this family.
    pub fn library_extension(&self) -> Option<&'static str> {
        match self {
            Self::Win32 => Some("dll"),
            Self::Linux => Some("so"),
            Self::Darwin => Some("dylib"),
            Self::Unsupported(_) => None,
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CPU architecture
// ============================================================================

/// CPU architecture of the running process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuArch {
    /// 64-bit x86.
    X64,
    /// 32-bit x86.
    Ia32,
    /// Anything else, with the raw name as reported.
    Unsupported(String),
}

impl CpuArch {
    /// Map an architecture name to a variant.
    ///
    /// Accepts `std::env::consts::ARCH` names (`x86_64`, `x86`) as well as
    /// `x64` and `ia32`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "x64" | "x86_64" | "amd64" => Self::X64,
            "ia32" | "x86" | "i686" | "i386" => Self::Ia32,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::X64 => "x64",
            Self::Ia32 => "ia32",
            Self::Unsupported(raw) => raw,
        }
    }

    /// Name of the flat legacy directory (`bin64` / `bin32`).
    pub const fn legacy_bin_dir(&self) -> Option<&'static str> {
        match self {
            Self::X64 => Some("bin64"),
            Self::Ia32 => Some("bin32"),
            Self::Unsupported(_) => None,
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Runtime version
// ============================================================================

/// Runtime version the driver ABI is tied to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeVersion {
    Release { major: u32, minor: u32, patch: u32 },
    /// The raw string did not match `major.minor.patch`.
    Unrecognized(String),
}

impl RuntimeVersion {
    /// Strictly parse `major.minor.patch`, with an optional leading `v`.
    ///
    /// Any other shape, including components that overflow `u32`, yields
    /// `Unrecognized` holding the raw input.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let parsed = VERSION_PATTERN.captures(trimmed).and_then(|caps| {
            let major = caps[1].parse::<u32>().ok()?;
            let minor = caps[2].parse::<u32>().ok()?;
            let patch = caps[3].parse::<u32>().ok()?;
            Some(Self::Release {
                major,
                minor,
                patch,
            })
        });
        parsed.unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
    }

    /// `(major, minor)` when the version was recognized.
    pub const fn major_minor(&self) -> Option<(u32, u32)> {
        match self {
            Self::Release { major, minor, .. } => Some((*major, *minor)),
            Self::Unrecognized(_) => None,
        }
    }

    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Release { .. })
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release {
                major,
                minor,
                patch,
            } => write!(f, "v{major}.{minor}.{patch}"),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

// ============================================================================
// Fingerprint
// ============================================================================

/// Identity of the running process used to pick a driver artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentFingerprint {
    pub os: OsFamily,
    pub arch: CpuArch,
    pub runtime: RuntimeVersion,
}

impl EnvironmentFingerprint {
    /// Build a fingerprint from raw names and a version string.
    pub fn from_parts(os: &str, arch: &str, runtime_version: &str) -> Self {
        Self {
            os: OsFamily::from_name(os),
            arch: CpuArch::from_name(arch),
            runtime: RuntimeVersion::parse(runtime_version),
        }
    }

    /// True when every component is in the supported enumeration.
    pub const fn is_supported(&self) -> bool {
        self.os.is_supported() && self.arch.is_supported() && self.runtime.is_supported()
    }

    /// Describe why this fingerprint cannot be resolved, if it cannot.
    pub fn unsupported_reason(&self) -> Option<String> {
        if !self.os.is_supported() {
            return Some(format!("operating system '{}' is not supported", self.os));
        }
        if !self.arch.is_supported() {
            return Some(format!("CPU architecture '{}' is not supported", self.arch));
        }
        if !self.runtime.is_supported() {
            return Some(format!(
                "runtime version '{}' is not of the form major.minor.patch",
                self.runtime
            ));
        }
        None
    }
}

impl fmt::Display for EnvironmentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "platform '{}', arch '{}', runtime '{}'",
            self.os, self.arch, self.runtime
        )
    }
}

/// Fingerprint the live process.
///
/// OS and architecture come from `std::env::consts`. The runtime version is
/// `SQLANY_RUNTIME_VERSION` when set, otherwise the host runtime version
/// captured at build time.
pub fn fingerprint() -> EnvironmentFingerprint {
    let runtime = env::var(RUNTIME_VERSION_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| HOST_RUNTIME_VERSION.to_string());
    EnvironmentFingerprint::from_parts(env::consts::OS, env::consts::ARCH, &runtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_version() {
        assert_eq!(
            RuntimeVersion::parse("16.2.0"),
            RuntimeVersion::Release {
                major: 16,
                minor: 2,
                patch: 0
            }
        );
    }

    #[test]
    fn test_parse_leading_v() {
        assert_eq!(
            RuntimeVersion::parse("v0.10.48").major_minor(),
            Some((0, 10))
        );
    }

    #[test]
    fn test_parse_rejects_partial_and_suffixed() {
        for raw in ["16.2", "16", "v16.2.0-rc1", "16.2.0.1", "", "vx.y.z", " 1. 2.3"] {
            assert!(
                matches!(RuntimeVersion::parse(raw), RuntimeVersion::Unrecognized(_)),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let version = RuntimeVersion::parse("99999999999.0.0");
        assert_eq!(
            version,
            RuntimeVersion::Unrecognized("99999999999.0.0".to_string())
        );
    }

    #[test]
    fn test_os_and_arch_aliases() {
        assert_eq!(OsFamily::from_name("windows"), OsFamily::Win32);
        assert_eq!(OsFamily::from_name("macos"), OsFamily::Darwin);
        assert_eq!(CpuArch::from_name("x86_64"), CpuArch::X64);
        assert_eq!(CpuArch::from_name("x86"), CpuArch::Ia32);
        assert_eq!(
            CpuArch::from_name("aarch64"),
            CpuArch::Unsupported("aarch64".to_string())
        );
    }

    #[test]
    fn test_unsupported_reason_names_component() {
        let fp = EnvironmentFingerprint::from_parts("linux", "arm", "v16.2.0");
        assert!(!fp.is_supported());
        assert!(fp.unsupported_reason().unwrap().contains("'arm'"));

        let fp = EnvironmentFingerprint::from_parts("linux", "x64", "garbage");
        assert!(fp.unsupported_reason().unwrap().contains("garbage"));

        let fp = EnvironmentFingerprint::from_parts("win32", "x64", "14.0.0");
        assert!(fp.is_supported());
        assert_eq!(fp.unsupported_reason(), None);
    }

    #[test]
    fn test_display_includes_every_component() {
        let fp = EnvironmentFingerprint::from_parts("linux", "ia32", "v16.2.1");
        assert_eq!(
            fp.to_string(),
            "platform 'linux', arch 'ia32', runtime 'v16.2.1'"
        );
    }

    #[test]
    fn test_live_fingerprint_never_panics() {
        let fp = fingerprint();
        assert!(!fp.os.as_str().is_empty());
    }
}
