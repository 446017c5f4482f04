//! Driver module boundary.
//!
//! The loaded driver is opaque to this crate except for one operation:
//! creating a connection object, used by the post-load smoke test.
//! [`DriverLoader`] is the seam between orchestration and the dynamic
//! loader so orchestration can be exercised without native artifacts.

mod native;

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

pub use native::{NativeLoader, REQUIRED_SYMBOLS};

/// Why a single candidate could not be loaded.
///
/// Handled inside orchestration: it only decides whether to advance to the
/// next candidate or to the build fallback.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("{} does not export `{symbol}`", path.display())]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
    },
}

/// Errors raised by a loaded driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver refused API version {requested} (max available {available})")]
    InitFailed { requested: u32, available: u32 },

    #[error("driver returned no connection object")]
    NoConnection,
}

/// Operations this crate needs from a loaded driver.
pub trait DriverModule: Send + Sync + fmt::Debug {
    /// File the driver was loaded from.
    fn path(&self) -> &Path;

    /// Create a connection object. Dropping the handle releases it.
    fn create_connection(&self) -> Result<ConnectionHandle, DriverError>;
}

/// Loads a driver artifact from disk.
pub trait DriverLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<DriverHandle, LoadError>;
}

/// Shared handle to a loaded driver.
///
/// Clones refer to the same loaded module; the module is never unloaded
/// while a handle is alive.
#[derive(Clone)]
pub struct DriverHandle {
    module: Arc<dyn DriverModule>,
}

impl DriverHandle {
    pub fn new(module: Arc<dyn DriverModule>) -> Self {
        Self { module }
    }

    pub fn path(&self) -> &Path {
        self.module.path()
    }

    pub fn create_connection(&self) -> Result<ConnectionHandle, DriverError> {
        self.module.create_connection()
    }

    /// True when both handles refer to the same loaded module.
    pub fn same_module(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.module, &other.module)
    }
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle")
            .field("path", &self.path())
            .finish()
    }
}

/// An open connection object owned by the caller.
///
/// The driver-specific state is released when the handle is dropped.
pub struct ConnectionHandle {
    _inner: Box<dyn Any + Send>,
}

impl ConnectionHandle {
    pub fn new(inner: impl Any + Send) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConnectionHandle")
    }
}
