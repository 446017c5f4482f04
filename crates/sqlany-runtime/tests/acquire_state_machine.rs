//! Integration tests for the load-or-build orchestrator.
//!
//! A fake loader treats files on disk as drivers: a file containing `ok`
//! loads, `no-connection` loads but fails the smoke test, anything else is
//! rejected as a corrupt library. A fake build runner returns scripted exit
//! codes and optionally writes the build output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlany_core::{ArtifactLayout, EnvironmentFingerprint};
use sqlany_runtime::{
    AcquireError, AcquireState, BuildAttemptResult, BuildError, BuildPhase, BuildRecord,
    BuildRunner, ConnectionHandle, DriverError, DriverHandle, DriverLoader, DriverModule,
    LoadError, Orchestrator, ResolutionTier, SmokeOutcome,
};
use tempfile::{TempDir, tempdir};

// ── Fakes ──────────────────────────────────────────────────────────

#[derive(Debug)]
struct FakeModule {
    path: PathBuf,
    connects: bool,
}

impl DriverModule for FakeModule {
    fn path(&self) -> &Path {
        &self.path
    }

    fn create_connection(&self) -> Result<ConnectionHandle, DriverError> {
        if self.connects {
            Ok(ConnectionHandle::new(()))
        } else {
            Err(DriverError::NoConnection)
        }
    }
}

#[derive(Clone, Default)]
struct FakeLoader {
    attempts: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeLoader {
    fn attempts(&self) -> Vec<PathBuf> {
        self.attempts.lock().unwrap().clone()
    }
}

impl DriverLoader for FakeLoader {
    fn load(&self, path: &Path) -> Result<DriverHandle, LoadError> {
        self.attempts.lock().unwrap().push(path.to_path_buf());
        let contents = fs::read_to_string(path).map_err(|_| LoadError::Missing {
            path: path.to_path_buf(),
        })?;
        let connects = match contents.trim() {
            "ok" => true,
            "no-connection" => false,
            other => {
                return Err(LoadError::Open {
                    path: path.to_path_buf(),
                    reason: format!("invalid ELF header ({other})"),
                });
            }
        };
        Ok(DriverHandle::new(Arc::new(FakeModule {
            path: path.to_path_buf(),
            connects,
        })))
    }
}

#[derive(Clone)]
struct FakeBuilder {
    configure_exit: i32,
    build_exit: i32,
    /// Written to this path with `output_contents` when the build phase succeeds.
    output: Option<PathBuf>,
    output_contents: &'static str,
    phases: Arc<Mutex<Vec<BuildPhase>>>,
}

impl FakeBuilder {
    fn new(configure_exit: i32, build_exit: i32) -> Self {
        Self {
            configure_exit,
            build_exit,
            output: None,
            output_contents: "ok",
            phases: Arc::default(),
        }
    }

    fn producing(mut self, output: PathBuf, contents: &'static str) -> Self {
        self.output = Some(output);
        self.output_contents = contents;
        self
    }

    fn phases(&self) -> Vec<BuildPhase> {
        self.phases.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildRunner for FakeBuilder {
    async fn run_phase(&self, phase: BuildPhase) -> Result<BuildAttemptResult, BuildError> {
        self.phases.lock().unwrap().push(phase);
        let exit = match phase {
            BuildPhase::Configure => self.configure_exit,
            BuildPhase::Build => self.build_exit,
        };
        if phase == BuildPhase::Build && exit == 0 {
            if let Some(output) = &self.output {
                fs::create_dir_all(output.parent().unwrap()).unwrap();
                fs::write(output, self.output_contents).unwrap();
            }
        }
        Ok(BuildAttemptResult {
            phase,
            exit_status: Some(exit),
            captured_output: format!("{phase} exited with {exit}"),
        })
    }

    fn describe(&self, phase: BuildPhase) -> String {
        format!("fake-{phase}")
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn put(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

struct Fixture {
    _dir: TempDir,
    layout: ArtifactLayout,
    fp: EnvironmentFingerprint,
}

fn fixture(os: &str, arch: &str, runtime: &str) -> Fixture {
    let dir = tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    Fixture {
        _dir: dir,
        layout,
        fp: EnvironmentFingerprint::from_parts(os, arch, runtime),
    }
}

impl Fixture {
    fn versioned(&self) -> PathBuf {
        self.layout.versioned_prebuilt(&self.fp).unwrap()
    }

    fn legacy(&self) -> PathBuf {
        self.layout.arch_prebuilt(&self.fp).unwrap()
    }

    fn local(&self) -> PathBuf {
        self.layout.local_build_output(&self.fp.os).unwrap()
    }

    fn orchestrator(
        &self,
        loader: FakeLoader,
        builder: FakeBuilder,
    ) -> Orchestrator<FakeLoader, FakeBuilder> {
        Orchestrator::new(self.fp.clone(), self.layout.clone(), loader, builder)
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_versioned_prebuilt_loads_without_building() {
    let fx = fixture("win32", "x64", "v14.0.0");
    assert!(fx.versioned().ends_with("prebuild/win32/x64/14_0/sqlanywhere.dll"));
    put(&fx.versioned(), "ok");

    let loader = FakeLoader::default();
    let builder = FakeBuilder::new(0, 0);
    let orch = fx.orchestrator(loader.clone(), builder.clone());

    let driver = orch.acquire().await.unwrap();
    assert_eq!(driver.tier, ResolutionTier::VersionedPrebuilt);
    assert_eq!(driver.path, fx.versioned());
    assert!(!driver.built);
    assert_eq!(driver.smoke, SmokeOutcome::Passed);
    assert_eq!(orch.state(), AcquireState::Loaded);
    assert!(builder.phases().is_empty());
    assert_eq!(loader.attempts(), vec![fx.versioned()]);
}

#[tokio::test]
async fn test_tiers_are_tried_in_priority_order() {
    let fx = fixture("linux", "x64", "v16.2.0");
    put(&fx.versioned(), "corrupt");
    put(&fx.legacy(), "corrupt");
    put(&fx.local(), "ok");

    let loader = FakeLoader::default();
    let builder = FakeBuilder::new(0, 0);
    let orch = fx.orchestrator(loader.clone(), builder.clone());

    let driver = orch.acquire().await.unwrap();
    assert_eq!(driver.tier, ResolutionTier::LocalBuildOutput);
    assert!(!driver.built);
    assert_eq!(
        loader.attempts(),
        vec![fx.versioned(), fx.legacy(), fx.local()]
    );
    assert!(builder.phases().is_empty());
}

#[tokio::test]
async fn test_legacy_bin_dir_used_when_versioned_missing() {
    let fx = fixture("linux", "ia32", "v0.10.48");
    assert!(fx.legacy().ends_with("bin32/sqlanywhere_v0_10.so"));
    put(&fx.legacy(), "ok");

    let orch = fx.orchestrator(FakeLoader::default(), FakeBuilder::new(0, 0));

    let driver = orch.acquire().await.unwrap();
    assert_eq!(driver.tier, ResolutionTier::ArchPrebuilt);
}

#[tokio::test]
async fn test_builds_when_nothing_prebuilt() {
    let fx = fixture("linux", "x64", "v16.2.0");
    let loader = FakeLoader::default();
    let builder = FakeBuilder::new(0, 0).producing(fx.local(), "ok");
    let orch = fx.orchestrator(loader.clone(), builder.clone());

    let driver = orch.acquire().await.unwrap();
    assert_eq!(builder.phases(), vec![BuildPhase::Configure, BuildPhase::Build]);
    assert_eq!(driver.tier, ResolutionTier::LocalBuildOutput);
    assert_eq!(driver.path, fx.local());
    assert!(driver.built);
    assert_eq!(loader.attempts(), vec![fx.local()]);

    let record = BuildRecord::load(&fx.layout.build_record_path()).unwrap();
    assert_eq!(record.fingerprint, fx.fp);
    assert_eq!(record.build_command, "fake-build");
}

#[tokio::test]
async fn test_compile_failure_is_fatal_and_skips_load() {
    let fx = fixture("linux", "x64", "v16.2.0");
    let loader = FakeLoader::default();
    let builder = FakeBuilder::new(0, 1);
    let orch = fx.orchestrator(loader.clone(), builder.clone());

    let err = orch.acquire().await.unwrap_err();
    match &err {
        AcquireError::BuildCompileFailed {
            command,
            exit_status,
            output,
        } => {
            assert_eq!(command, "fake-build");
            assert_eq!(*exit_status, Some(1));
            assert!(output.contains("build exited with 1"));
        }
        other => panic!("expected BuildCompileFailed, got {other:?}"),
    }
    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), 4);
    assert_eq!(orch.state(), AcquireState::Failed);
    assert!(loader.attempts().is_empty());
}

#[tokio::test]
async fn test_configure_failure_never_runs_build() {
    let fx = fixture("darwin", "x64", "v18.1.0");
    let builder = FakeBuilder::new(2, 0);
    let orch = fx.orchestrator(FakeLoader::default(), builder.clone());

    let err = orch.acquire().await.unwrap_err();
    assert!(matches!(
        err,
        AcquireError::BuildConfigureFailed {
            exit_status: Some(2),
            ..
        }
    ));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(builder.phases(), vec![BuildPhase::Configure]);
}

#[tokio::test]
async fn test_fatal_failure_is_sticky() {
    let fx = fixture("linux", "x64", "v16.2.0");
    let builder = FakeBuilder::new(1, 0);
    let orch = fx.orchestrator(FakeLoader::default(), builder.clone());

    assert!(orch.acquire().await.is_err());
    let err = orch.acquire().await.unwrap_err();
    assert!(matches!(err, AcquireError::BuildPreviouslyFailed));
    assert!(err.is_fatal());
    assert_eq!(builder.phases().len(), 1);
}

#[tokio::test]
async fn test_unsupported_arch_never_builds() {
    let fx = fixture("linux", "arm64", "v16.2.0");
    let loader = FakeLoader::default();
    let builder = FakeBuilder::new(0, 0);
    let orch = fx.orchestrator(loader.clone(), builder.clone());

    let err = orch.acquire().await.unwrap_err();
    match &err {
        AcquireError::UnsupportedPlatform { reason, .. } => assert!(reason.contains("arm64")),
        other => panic!("expected UnsupportedPlatform, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert!(builder.phases().is_empty());
    assert!(loader.attempts().is_empty());

    // Returned again on every call.
    assert!(matches!(
        orch.acquire().await,
        Err(AcquireError::UnsupportedPlatform { .. })
    ));
}

#[tokio::test]
async fn test_unrecognized_runtime_version_is_unsupported() {
    let fx = fixture("linux", "x64", "16.2");
    let orch = fx.orchestrator(FakeLoader::default(), FakeBuilder::new(0, 0));

    assert!(matches!(
        orch.acquire().await,
        Err(AcquireError::UnsupportedPlatform { .. })
    ));
}

#[tokio::test]
async fn test_unloadable_build_output_is_removed() {
    let fx = fixture("linux", "x64", "v16.2.0");
    let loader = FakeLoader::default();
    let builder = FakeBuilder::new(0, 0).producing(fx.local(), "corrupt");
    let orch = fx.orchestrator(loader.clone(), builder.clone());

    let err = orch.acquire().await.unwrap_err();
    match &err {
        AcquireError::DriverUnavailable { fingerprint, detail } => {
            assert_eq!(fingerprint, &fx.fp);
            assert!(detail.contains("invalid ELF header"));
        }
        other => panic!("expected DriverUnavailable, got {other:?}"),
    }
    assert!(!err.is_fatal());
    assert_eq!(err.exit_code(), 1);
    assert!(!fx.local().exists());
    assert_eq!(orch.state(), AcquireState::Unresolved);

    // The removed artifact is no longer a candidate; the next call rebuilds.
    let _ = orch.acquire().await;
    assert_eq!(loader.attempts(), vec![fx.local(), fx.local()]);
    assert_eq!(builder.phases().len(), 4);
}

#[tokio::test]
async fn test_loaded_handle_is_shared_across_calls() {
    let fx = fixture("linux", "x64", "v16.2.0");
    put(&fx.versioned(), "ok");
    let loader = FakeLoader::default();
    let orch = fx.orchestrator(loader.clone(), FakeBuilder::new(0, 0));

    let first = orch.acquire().await.unwrap();
    fs::remove_file(fx.versioned()).unwrap();
    let second = orch.acquire().await.unwrap();

    assert!(first.handle.same_module(&second.handle));
    assert_eq!(loader.attempts().len(), 1);
    assert!(orch.loaded().is_some());
}

#[tokio::test]
async fn test_concurrent_callers_share_one_load() {
    let fx = fixture("linux", "x64", "v16.2.0");
    put(&fx.versioned(), "ok");
    let loader = FakeLoader::default();
    let orch = Arc::new(fx.orchestrator(loader.clone(), FakeBuilder::new(0, 0)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.acquire().await.unwrap() })
        })
        .collect();

    let mut drivers = Vec::new();
    for handle in handles {
        drivers.push(handle.await.unwrap());
    }
    assert!(drivers.windows(2).all(|w| w[0].handle.same_module(&w[1].handle)));
    assert_eq!(loader.attempts().len(), 1);
}

#[tokio::test]
async fn test_smoke_test_failure_is_advisory() {
    let fx = fixture("linux", "x64", "v16.2.0");
    put(&fx.versioned(), "no-connection");
    let orch = fx.orchestrator(FakeLoader::default(), FakeBuilder::new(0, 0));

    let driver = orch.acquire().await.unwrap();
    assert!(matches!(driver.smoke, SmokeOutcome::Failed(_)));
    assert_eq!(orch.state(), AcquireState::Loaded);
}

#[tokio::test]
async fn test_smoke_test_can_be_disabled() {
    let fx = fixture("linux", "x64", "v16.2.0");
    put(&fx.versioned(), "no-connection");
    let orch = fx
        .orchestrator(FakeLoader::default(), FakeBuilder::new(0, 0))
        .with_smoke_test(false);

    let driver = orch.acquire().await.unwrap();
    assert_eq!(driver.smoke, SmokeOutcome::Skipped);
}
