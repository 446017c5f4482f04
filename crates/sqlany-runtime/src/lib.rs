//! Locate, load or build the SQL Anywhere native driver.
//!
//! ```rust,ignore
//! use sqlany_core::LoaderConfig;
//! use sqlany_runtime::acquire_driver;
//!
//! let config = LoaderConfig::load("/opt/sqlany")?;
//! let driver = acquire_driver(&config).await?;
//! let conn = driver.handle.create_connection()?;
//! ```
//!
//! # Feature Flags
//!
//! - `cli`: Enables `CliProgress` for terminal progress bars during builds.

#![deny(unsafe_code)]

pub mod acquire;
pub mod build;
pub mod driver;
pub mod progress;
pub mod resolve;

pub use acquire::{
    AcquireError, AcquireState, AcquiredDriver, Orchestrator, SmokeOutcome, acquire_driver,
    acquire_driver_or_exit, acquire_driver_with_progress, driver,
};
pub use build::{
    BuildAttemptResult, BuildError, BuildPhase, BuildRecord, BuildRunner, CommandBuildRunner,
};
pub use driver::{
    ConnectionHandle, DriverError, DriverHandle, DriverLoader, DriverModule, LoadError,
    NativeLoader,
};
pub use progress::{NoopProgress, ProgressReporter};
pub use resolve::{CandidatePath, Resolution, ResolutionTier, plan, resolve};

#[cfg(feature = "cli")]
pub use progress::CliProgress;
