//! Load-or-build orchestration.
//!
//! ```text
//! Unresolved → TryingCandidates → Loaded
//!                    ↓
//!                 Building → Loaded | Failed
//! ```
//!
//! `Loaded` is sticky: later calls get the same handle without resolving
//! again. `Failed` (a fatal build failure) is sticky too. A call that ends
//! in `DriverUnavailable` returns to `Unresolved` so it can be retried.

mod error;
mod global;

pub use error::{
    AcquireError, EXIT_COMPILE_FAILED, EXIT_CONFIGURE_FAILED, EXIT_DRIVER_UNAVAILABLE,
    EXIT_UNSUPPORTED_PLATFORM,
};
pub use global::{acquire_driver, acquire_driver_or_exit, acquire_driver_with_progress, driver};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sqlany_core::{ArtifactLayout, EnvironmentFingerprint};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::build::{BuildPhase, BuildRecord, BuildRunner};
use crate::driver::{DriverHandle, DriverLoader};
use crate::resolve::{Resolution, ResolutionTier, resolve};

/// Where the orchestrator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireState {
    Unresolved,
    TryingCandidates,
    Building,
    Loaded,
    Failed,
}

/// Result of the post-load smoke test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeOutcome {
    Passed,
    /// Advisory: the handle is still returned.
    Failed(String),
    Skipped,
}

impl fmt::Display for SmokeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// A loaded driver and how it was obtained.
#[derive(Debug, Clone)]
pub struct AcquiredDriver {
    pub handle: DriverHandle,
    pub tier: ResolutionTier,
    pub path: PathBuf,
    /// True when the artifact was produced by this call's build.
    pub built: bool,
    pub smoke: SmokeOutcome,
}

/// Drives fingerprint → candidates → load, falling back to a build.
pub struct Orchestrator<L, B> {
    fingerprint: EnvironmentFingerprint,
    layout: ArtifactLayout,
    loader: L,
    builder: B,
    smoke_test: bool,
    state: Mutex<AcquireState>,
    loaded: OnceCell<AcquiredDriver>,
}

impl<L: DriverLoader, B: BuildRunner> Orchestrator<L, B> {
    pub fn new(
        fingerprint: EnvironmentFingerprint,
        layout: ArtifactLayout,
        loader: L,
        builder: B,
    ) -> Self {
        Self {
            fingerprint,
            layout,
            loader,
            builder,
            smoke_test: true,
            state: Mutex::new(AcquireState::Unresolved),
            loaded: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn with_smoke_test(mut self, enabled: bool) -> Self {
        self.smoke_test = enabled;
        self
    }

    pub const fn fingerprint(&self) -> &EnvironmentFingerprint {
        &self.fingerprint
    }

    pub const fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn state(&self) -> AcquireState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The driver, if a previous call loaded it.
    pub fn loaded(&self) -> Option<&AcquiredDriver> {
        self.loaded.get()
    }

    /// Acquire the driver, loading or building it on first use.
    ///
    /// Concurrent callers wait for the first one; once loaded, every call
    /// returns the same handle.
    pub async fn acquire(&self) -> Result<AcquiredDriver, AcquireError> {
        self.loaded
            .get_or_try_init(|| self.load_or_build())
            .await
            .cloned()
    }

    fn set_state(&self, next: AcquireState) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state != next {
            info!(from = ?*state, to = ?next, "Driver acquisition state changed");
            *state = next;
        }
    }

    async fn load_or_build(&self) -> Result<AcquiredDriver, AcquireError> {
        if self.state() == AcquireState::Failed {
            return Err(AcquireError::BuildPreviouslyFailed);
        }

        let candidates = match resolve(&self.fingerprint, &self.layout) {
            Resolution::Unsupported { reason } => {
                warn!(fingerprint = %self.fingerprint, %reason, "Unsupported platform");
                return Err(AcquireError::UnsupportedPlatform {
                    fingerprint: self.fingerprint.clone(),
                    reason,
                });
            }
            Resolution::Candidates(candidates) => candidates,
        };

        self.set_state(AcquireState::TryingCandidates);
        let mut failures = Vec::new();
        for candidate in &candidates {
            match self.loader.load(&candidate.path) {
                Ok(handle) => {
                    info!(
                        tier = %candidate.tier,
                        path = %candidate.path.display(),
                        "Loaded driver"
                    );
                    return Ok(self.finish(handle, candidate.tier, &candidate.path, false));
                }
                Err(e) => {
                    warn!(tier = %candidate.tier, error = %e, "Driver candidate failed to load");
                    failures.push(format!("  {}: {e}", candidate.tier));
                }
            }
        }

        if candidates.is_empty() {
            info!(fingerprint = %self.fingerprint, "No prebuilt driver found, building from source");
        } else {
            info!("No driver candidate loaded, building from source");
        }
        // Supported fingerprints always have a local build path.
        let Some(output) = self.layout.local_build_output(&self.fingerprint.os) else {
            self.set_state(AcquireState::Unresolved);
            return Err(AcquireError::DriverUnavailable {
                fingerprint: self.fingerprint.clone(),
                detail: "no local build output path for this platform".to_string(),
            });
        };

        self.set_state(AcquireState::Building);
        self.build().await?;

        match self.loader.load(&output) {
            Ok(handle) => {
                info!(path = %output.display(), "Loaded freshly built driver");
                self.save_build_record();
                Ok(self.finish(handle, ResolutionTier::LocalBuildOutput, &output, true))
            }
            Err(e) => {
                failures.push(format!("  rebuilt {}: {e}", ResolutionTier::LocalBuildOutput));
                remove_stale_artifact(&output);
                self.set_state(AcquireState::Unresolved);
                Err(AcquireError::DriverUnavailable {
                    fingerprint: self.fingerprint.clone(),
                    detail: failures.join("\n"),
                })
            }
        }
    }

    /// Run configure then build. Any failure here is fatal.
    async fn build(&self) -> Result<(), AcquireError> {
        let configure = self
            .builder
            .run_phase(BuildPhase::Configure)
            .await
            .map_err(|e| self.fatal(e.into()))?;
        if !configure.succeeded() {
            return Err(self.fatal(AcquireError::BuildConfigureFailed {
                command: self.builder.describe(BuildPhase::Configure),
                exit_status: configure.exit_status,
                output: configure.captured_output,
            }));
        }

        let build = self
            .builder
            .run_phase(BuildPhase::Build)
            .await
            .map_err(|e| self.fatal(e.into()))?;
        if !build.succeeded() {
            return Err(self.fatal(AcquireError::BuildCompileFailed {
                command: self.builder.describe(BuildPhase::Build),
                exit_status: build.exit_status,
                output: build.captured_output,
            }));
        }

        Ok(())
    }

    fn fatal(&self, err: AcquireError) -> AcquireError {
        error!(error = %err, "Driver build failed");
        self.set_state(AcquireState::Failed);
        err
    }

    fn finish(
        &self,
        handle: DriverHandle,
        tier: ResolutionTier,
        path: &Path,
        built: bool,
    ) -> AcquiredDriver {
        let smoke = if self.smoke_test {
            match handle.create_connection() {
                Ok(connection) => {
                    drop(connection);
                    SmokeOutcome::Passed
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Driver loaded but smoke test failed");
                    SmokeOutcome::Failed(e.to_string())
                }
            }
        } else {
            SmokeOutcome::Skipped
        };

        self.set_state(AcquireState::Loaded);
        AcquiredDriver {
            handle,
            tier,
            path: path.to_path_buf(),
            built,
            smoke,
        }
    }

    fn save_build_record(&self) {
        let record = BuildRecord::new(
            self.fingerprint.clone(),
            self.builder.describe(BuildPhase::Configure),
            self.builder.describe(BuildPhase::Build),
        );
        let path = self.layout.build_record_path();
        if let Err(e) = record.save(&path) {
            warn!(path = %path.display(), error = %e, "Failed to write build record");
        }
    }
}

/// Delete an artifact that built but would not load, so later attempts do
/// not pick it up as a candidate.
fn remove_stale_artifact(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => warn!(path = %path.display(), "Removed unloadable build output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove unloadable build output"),
    }
}
