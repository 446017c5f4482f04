//! Process-wide driver singleton.
//!
//! The first call fixes the configuration; the orchestrator it creates lives
//! for the rest of the process and hands out the same driver handle to every
//! later caller.

use std::sync::{Arc, OnceLock};

use sqlany_core::LoaderConfig;
use tracing::{debug, error};

use super::{AcquireError, AcquiredDriver, Orchestrator};
use crate::build::CommandBuildRunner;
use crate::driver::{DriverHandle, NativeLoader};
use crate::progress::{NoopProgress, ProgressReporter};

static ORCHESTRATOR: OnceLock<Orchestrator<NativeLoader, CommandBuildRunner>> = OnceLock::new();

/// Acquire the process-wide driver without progress output.
pub async fn acquire_driver(config: &LoaderConfig) -> Result<AcquiredDriver, AcquireError> {
    acquire_driver_with_progress(config, Arc::new(NoopProgress)).await
}

/// Acquire the process-wide driver, reporting build progress to `progress`.
///
/// `config` and `progress` are only used by the first call in the process.
pub async fn acquire_driver_with_progress(
    config: &LoaderConfig,
    progress: Arc<dyn ProgressReporter>,
) -> Result<AcquiredDriver, AcquireError> {
    let orchestrator = ORCHESTRATOR.get_or_init(|| {
        Orchestrator::new(
            config.fingerprint(),
            config.layout(),
            NativeLoader,
            CommandBuildRunner::from_config(config, progress),
        )
        .with_smoke_test(config.smoke_test)
    });

    if orchestrator.layout().root() != config.root.as_path() {
        debug!(
            active = %orchestrator.layout().root().display(),
            requested = %config.root.display(),
            "Driver singleton already configured, ignoring new package root"
        );
    }

    orchestrator.acquire().await
}

/// Install-time entry point: like [`acquire_driver_with_progress`], but a
/// fatal build failure terminates the process with its exit code.
pub async fn acquire_driver_or_exit(
    config: &LoaderConfig,
    progress: Arc<dyn ProgressReporter>,
) -> Result<AcquiredDriver, AcquireError> {
    match acquire_driver_with_progress(config, progress).await {
        Err(e) if e.is_fatal() => {
            error!(error = %e, "Fatal driver build failure");
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
        other => other,
    }
}

/// The process-wide driver, if it has been loaded.
pub fn driver() -> Option<DriverHandle> {
    ORCHESTRATOR
        .get()?
        .loaded()
        .map(|acquired| acquired.handle.clone())
}
