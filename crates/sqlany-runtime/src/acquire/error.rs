//! Errors surfaced by driver acquisition.
//!
//! Per-candidate load failures never appear here; they are consumed inside
//! the orchestrator. What remains is either terminal for the call
//! (`UnsupportedPlatform`, `DriverUnavailable`) or fatal for the process
//! (build failures).

use sqlany_core::EnvironmentFingerprint;
use thiserror::Error;

use crate::build::BuildError;

/// Exit code for `DriverUnavailable` and errors without a dedicated code.
pub const EXIT_DRIVER_UNAVAILABLE: i32 = 1;
pub const EXIT_UNSUPPORTED_PLATFORM: i32 = 2;
pub const EXIT_CONFIGURE_FAILED: i32 = 3;
pub const EXIT_COMPILE_FAILED: i32 = 4;

#[derive(Debug, Error)]
pub enum AcquireError {
    /// No resolution strategy exists for this environment.
    #[error("Platform not supported ({fingerprint}): {reason}")]
    UnsupportedPlatform {
        fingerprint: EnvironmentFingerprint,
        reason: String,
    },

    /// The configure phase exited non-zero.
    #[error(
        "Driver build configure step `{command}` failed (exit code: {}):\n{output}",
        exit_status.map_or_else(|| "signal".to_string(), |c| c.to_string())
    )]
    BuildConfigureFailed {
        command: String,
        exit_status: Option<i32>,
        output: String,
    },

    /// The build phase exited non-zero.
    #[error(
        "Driver build step `{command}` failed (exit code: {}):\n{output}",
        exit_status.map_or_else(|| "signal".to_string(), |c| c.to_string())
    )]
    BuildCompileFailed {
        command: String,
        exit_status: Option<i32>,
        output: String,
    },

    /// The build tool could not be started.
    #[error("{0}\n\nMake sure the build toolchain is installed and in the PATH.")]
    BuildLaunch(#[from] BuildError),

    /// A fatal build failure already happened in this process.
    #[error("Driver build failed earlier in this process; restart to retry")]
    BuildPreviouslyFailed,

    /// Every candidate and the rebuilt artifact failed to load.
    #[error("Could not load the driver for {fingerprint}:\n{detail}")]
    DriverUnavailable {
        fingerprint: EnvironmentFingerprint,
        detail: String,
    },
}

impl AcquireError {
    /// Build failures happen at install time and end the process.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BuildConfigureFailed { .. }
                | Self::BuildCompileFailed { .. }
                | Self::BuildLaunch(_)
                | Self::BuildPreviouslyFailed
        )
    }

    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedPlatform { .. } => EXIT_UNSUPPORTED_PLATFORM,
            Self::BuildConfigureFailed { .. } | Self::BuildLaunch(_) => EXIT_CONFIGURE_FAILED,
            Self::BuildCompileFailed { .. } | Self::BuildPreviouslyFailed => EXIT_COMPILE_FAILED,
            Self::DriverUnavailable { .. } => EXIT_DRIVER_UNAVAILABLE,
        }
    }
}
