//! Progress reporting for driver builds.
//!
//! The build pipeline reports each phase, the step counters it finds in tool
//! output, and every output line through [`ProgressReporter`]. Library callers
//! use [`NoopProgress`]; the CLI renders a spinner that turns into a bar once
//! the build tool starts printing step counters.
//!
//! # Feature Flags
//!
//! - `cli`: Enables `CliProgress` (`indicatif`).

use crate::build::BuildPhase;

/// Receives build progress. Calls come from the task driving the build and
/// never overlap.
pub trait ProgressReporter: Send + Sync {
    /// A phase started running `command`.
    fn phase_started(&self, phase: BuildPhase, command: &str);

    /// Step counter parsed from tool output (`[ 50%]`, `[3/8]`).
    fn step(&self, current: u64, total: u64);

    /// One line of tool output, stdout and stderr interleaved.
    fn output_line(&self, line: &str);

    /// The phase ended. `success` is false for a non-zero exit or a tool
    /// that could not be started.
    fn phase_finished(&self, phase: BuildPhase, success: bool);
}

/// Ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn phase_started(&self, _phase: BuildPhase, _command: &str) {}
    fn step(&self, _current: u64, _total: u64) {}
    fn output_line(&self, _line: &str) {}
    fn phase_finished(&self, _phase: BuildPhase, _success: bool) {}
}

#[cfg(feature = "cli")]
pub mod cli_progress {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use indicatif::{ProgressBar, ProgressStyle};

    use super::ProgressReporter;
    use crate::build::BuildPhase;

    const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {prefix:.bold} {wide_msg}";
    const BAR_TEMPLATE: &str =
        "{spinner:.green} [{elapsed_precise}] {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";

    /// Terminal progress for `sqlany install`.
    ///
    /// The latest output line is shown next to the spinner; full output goes
    /// to the log at `debug` and into the error on failure.
    #[derive(Default)]
    pub struct CliProgress {
        bar: Mutex<Option<ProgressBar>>,
    }

    impl CliProgress {
        pub fn new() -> Self {
            Self::default()
        }

        fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
            self.bar.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn style(template: &str) -> ProgressStyle {
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .progress_chars("#>-")
        }
    }

    impl ProgressReporter for CliProgress {
        fn phase_started(&self, phase: BuildPhase, command: &str) {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::style(SPINNER_TEMPLATE));
            pb.set_prefix(phase.to_string());
            pb.set_message(command.to_string());
            pb.enable_steady_tick(std::time::Duration::from_millis(120));
            *self.bar() = Some(pb);
        }

        fn step(&self, current: u64, total: u64) {
            if let Some(pb) = self.bar().as_ref() {
                if pb.length() != Some(total) {
                    pb.set_style(Self::style(BAR_TEMPLATE));
                    pb.set_length(total);
                }
                pb.set_position(current);
            }
        }

        fn output_line(&self, line: &str) {
            if let Some(pb) = self.bar().as_ref() {
                pb.set_message(line.trim().to_string());
            }
        }

        fn phase_finished(&self, phase: BuildPhase, success: bool) {
            if let Some(pb) = self.bar().take() {
                if success {
                    pb.finish_with_message(format!("✓ {phase} complete"));
                } else {
                    pb.abandon_with_message(format!("✗ {phase} failed"));
                }
            }
        }
    }
}

#[cfg(feature = "cli")]
pub use cli_progress::CliProgress;
