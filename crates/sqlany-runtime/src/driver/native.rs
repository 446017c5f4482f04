//! Dynamic loading of the native driver through the SQL Anywhere C API.
//!
//! An artifact counts as loaded only when the library opens and exports
//! every entry point in [`REQUIRED_SYMBOLS`]. Entry points are copied out of
//! the library once; the `Library` is kept alive alongside them for as long
//! as any handle or connection refers to it.

#![allow(unsafe_code)]

use std::ffi::{CStr, c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

use libloading::Library;
use tracing::debug;

use super::{ConnectionHandle, DriverError, DriverHandle, DriverLoader, DriverModule, LoadError};

/// Entry points a driver artifact must export.
pub const REQUIRED_SYMBOLS: [&str; 4] = [
    "sqlany_init",
    "sqlany_fini",
    "sqlany_new_connection",
    "sqlany_free_connection",
];

/// `SQLANY_API_VERSION_4`
const API_VERSION: u32 = 4;

const APP_NAME: &CStr = c"sqlany-loader";

type InitFn = unsafe extern "C" fn(*const c_char, u32, *mut u32) -> i32;
type FiniFn = unsafe extern "C" fn();
type NewConnectionFn = unsafe extern "C" fn() -> *mut c_void;
type FreeConnectionFn = unsafe extern "C" fn(*mut c_void);

/// Loader backed by the platform dynamic linker.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl DriverLoader for NativeLoader {
    fn load(&self, path: &Path) -> Result<DriverHandle, LoadError> {
        if !path.is_file() {
            return Err(LoadError::Missing {
                path: path.to_path_buf(),
            });
        }

        let library = NativeLibrary::open(path)?;
        debug!(path = %path.display(), "Loaded native driver");
        Ok(DriverHandle::new(Arc::new(NativeDriver {
            library: Arc::new(library),
        })))
    }
}

struct NativeLibrary {
    path: PathBuf,
    init: InitFn,
    fini: FiniFn,
    new_connection: NewConnectionFn,
    free_connection: FreeConnectionFn,
    /// `Ok` once `sqlany_init` succeeded, `Err(max available version)` otherwise.
    initialized: OnceLock<Result<(), u32>>,
    _library: Library,
}

impl NativeLibrary {
    fn open(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: loading runs the library's initializers; driver artifacts
        // are trusted files from the package root.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let [init, fini, new_connection, free_connection] = REQUIRED_SYMBOLS;
        Ok(Self {
            path: path.to_path_buf(),
            init: symbol::<InitFn>(&library, path, init)?,
            fini: symbol::<FiniFn>(&library, path, fini)?,
            new_connection: symbol::<NewConnectionFn>(&library, path, new_connection)?,
            free_connection: symbol::<FreeConnectionFn>(&library, path, free_connection)?,
            initialized: OnceLock::new(),
            _library: library,
        })
    }

    fn ensure_initialized(&self) -> Result<(), DriverError> {
        let outcome = *self.initialized.get_or_init(|| {
            let mut available: u32 = 0;
            // SAFETY: signature matches `sqlany_init` in sacapi.h.
            let ok = unsafe { (self.init)(APP_NAME.as_ptr(), API_VERSION, &mut available) };
            if ok == 0 { Err(available) } else { Ok(()) }
        });
        outcome.map_err(|available| DriverError::InitFailed {
            requested: API_VERSION,
            available,
        })
    }
}

impl Drop for NativeLibrary {
    fn drop(&mut self) {
        if matches!(self.initialized.get(), Some(Ok(()))) {
            // SAFETY: balanced with the successful `sqlany_init` above.
            unsafe { (self.fini)() };
        }
    }
}

fn symbol<T: Copy>(library: &Library, path: &Path, name: &'static str) -> Result<T, LoadError> {
    let mut nul_terminated = name.as_bytes().to_vec();
    nul_terminated.push(0);
    // SAFETY: `T` is the C signature documented for `name`; the copied
    // pointer is only used while `library` is alive (same struct).
    unsafe { library.get::<T>(&nul_terminated) }
        .map(|sym| *sym)
        .map_err(|_| LoadError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: name,
        })
}

#[derive(Debug)]
struct NativeDriver {
    library: Arc<NativeLibrary>,
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DriverModule for NativeDriver {
    fn path(&self) -> &Path {
        &self.library.path
    }

    fn create_connection(&self) -> Result<ConnectionHandle, DriverError> {
        self.library.ensure_initialized()?;
        // SAFETY: the API is initialized; the returned object is freed in
        // `NativeConnection::drop`.
        let raw = unsafe { (self.library.new_connection)() };
        let raw = NonNull::new(raw).ok_or(DriverError::NoConnection)?;
        Ok(ConnectionHandle::new(NativeConnection {
            library: Arc::clone(&self.library),
            raw,
        }))
    }
}

struct NativeConnection {
    library: Arc<NativeLibrary>,
    raw: NonNull<c_void>,
}

// SAFETY: a connection object is not tied to the creating thread; the
// driver only requires it not be used concurrently, which ownership ensures.
unsafe impl Send for NativeConnection {}

impl Drop for NativeConnection {
    fn drop(&mut self) {
        // SAFETY: `raw` came from `sqlany_new_connection` and is freed once.
        unsafe { (self.library.free_connection)(self.raw.as_ptr()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_artifact() {
        let result = NativeLoader.load(Path::new("/nonexistent/sqlanywhere.so"));
        assert!(matches!(result, Err(LoadError::Missing { .. })));
    }

    #[test]
    fn test_garbage_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sqlanywhere.so");
        std::fs::write(&path, b"definitely not a shared library").unwrap();

        let result = NativeLoader.load(&path);
        assert!(matches!(result, Err(LoadError::Open { .. })));
    }

    #[test]
    fn test_directory_is_not_an_artifact() {
        let dir = tempdir().unwrap();
        let result = NativeLoader.load(dir.path());
        assert!(matches!(result, Err(LoadError::Missing { .. })));
    }

    /// A real shared library that is not a driver opens fine and then fails
    /// on the first entry point.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_library_without_entry_points_reports_first_missing_symbol() {
        let Some(libm) = [
            "/lib/x86_64-linux-gnu",
            "/usr/lib/x86_64-linux-gnu",
            "/lib/aarch64-linux-gnu",
            "/usr/lib/aarch64-linux-gnu",
            "/lib64",
            "/usr/lib64",
            "/lib",
            "/usr/lib",
        ]
        .iter()
        .map(|dir| Path::new(dir).join("libm.so.6"))
        .find(|path| path.is_file()) else {
            return;
        };

        match NativeLoader.load(&libm) {
            Err(LoadError::MissingSymbol { path, symbol }) => {
                assert_eq!(symbol, "sqlany_init");
                assert_eq!(path, libm);
            }
            other => panic!("expected MissingSymbol, got {other:?}"),
        }
    }
}
