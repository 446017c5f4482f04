//! Two-phase build pipeline for the driver.
//!
//! The external toolchain is opaque: each phase is one command run in the
//! package root, and only its exit status decides success. Output from both
//! streams is forwarded to the progress reporter and captured verbatim for
//! diagnostics.

mod record;

pub use record::BuildRecord;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use sqlany_core::{CommandSpec, LoaderConfig};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::progress::ProgressReporter;

/// Phase of the external build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    Configure,
    Build,
}

impl BuildPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one phase invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildAttemptResult {
    pub phase: BuildPhase,
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_status: Option<i32>,
    /// Interleaved stdout and stderr.
    pub captured_output: String,
}

impl BuildAttemptResult {
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_status, Some(0))
    }
}

/// The phase could not be run at all.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to run {phase} command `{command}`: {source}")]
    Spawn {
        phase: BuildPhase,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {phase} command: {source}")]
    Wait {
        phase: BuildPhase,
        #[source]
        source: std::io::Error,
    },
}

/// Runs build phases.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Run one phase to completion.
    async fn run_phase(&self, phase: BuildPhase) -> Result<BuildAttemptResult, BuildError>;

    /// Human-readable command line for a phase, for records and messages.
    fn describe(&self, phase: BuildPhase) -> String;
}

/// Runs the configured commands as child processes.
pub struct CommandBuildRunner {
    root: PathBuf,
    configure: CommandSpec,
    build: CommandSpec,
    progress: Arc<dyn ProgressReporter>,
}

impl CommandBuildRunner {
    pub fn new(
        root: impl Into<PathBuf>,
        configure: CommandSpec,
        build: CommandSpec,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            root: root.into(),
            configure,
            build,
            progress,
        }
    }

    pub fn from_config(config: &LoaderConfig, progress: Arc<dyn ProgressReporter>) -> Self {
        Self::new(
            &config.root,
            config.configure_command.clone(),
            config.build_command.clone(),
            progress,
        )
    }

    const fn command(&self, phase: BuildPhase) -> &CommandSpec {
        match phase {
            BuildPhase::Configure => &self.configure,
            BuildPhase::Build => &self.build,
        }
    }
}

#[async_trait]
impl BuildRunner for CommandBuildRunner {
    async fn run_phase(&self, phase: BuildPhase) -> Result<BuildAttemptResult, BuildError> {
        let spec = self.command(phase);
        info!(%phase, command = %spec, root = %self.root.display(), "Running build phase");
        run_command(&self.root, phase, spec, self.progress.as_ref()).await
    }

    fn describe(&self, phase: BuildPhase) -> String {
        self.command(phase).to_string()
    }
}

async fn run_command(
    root: &Path,
    phase: BuildPhase,
    spec: &CommandSpec,
    progress: &dyn ProgressReporter,
) -> Result<BuildAttemptResult, BuildError> {
    progress.phase_started(phase, &spec.to_string());

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            progress.phase_finished(phase, false);
            BuildError::Spawn {
                phase,
                command: spec.to_string(),
                source,
            }
        })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx.clone()));
    }
    // Channel closes once both readers hit EOF.
    drop(tx);

    let mut captured = String::new();
    let mut last_step: Option<(u64, u64)> = None;
    while let Some(line) = rx.recv().await {
        debug!(%phase, "{}", line);
        if let Some((current, total)) = parse_step(&line)
            && last_step.is_none_or(|(seen, seen_total)| total != seen_total || current > seen)
        {
            progress.step(current, total);
            last_step = Some((current, total));
        }
        if !line.trim().is_empty() {
            progress.output_line(&line);
        }
        captured.push_str(&line);
        captured.push('\n');
    }

    let status = child
        .wait()
        .await
        .map_err(|source| BuildError::Wait { phase, source })?;

    let result = BuildAttemptResult {
        phase,
        exit_status: status.code(),
        captured_output: captured,
    };

    progress.phase_finished(phase, result.succeeded());

    Ok(result)
}

/// Forward output lines until EOF. Bytes that are not UTF-8 are replaced,
/// never treated as the end of the stream.
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if tx.send(line.trim_end_matches(['\n', '\r']).to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to read build output, discarding the rest");
                break;
            }
        }
    }
    drop(tx);
    // The pipe stays open until the child exits so it never sees SIGPIPE.
    if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
        debug!(error = %e, "Stopped draining build output");
    }
}

/// Step counter at the start of a build output line.
///
/// Make prints `[ 50%] Building ...` and Ninja prints `[3/8] Linking ...`.
/// Returns `(current, total)`; counters past their total are ignored.
fn parse_step(line: &str) -> Option<(u64, u64)> {
    let (counter, _) = line.trim_start().strip_prefix('[')?.split_once(']')?;

    if let Some(percent) = counter.strip_suffix('%') {
        let percent: u64 = percent.trim().parse().ok()?;
        return (percent <= 100).then_some((percent, 100));
    }

    let (current, total) = counter.split_once('/')?;
    let current: u64 = current.trim().parse().ok()?;
    let total: u64 = total.trim().parse().ok()?;
    (total > 0 && current <= total).then_some((current, total))
}
