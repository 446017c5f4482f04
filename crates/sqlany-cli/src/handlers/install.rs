//! Install command handler.
//!
//! The install-time flow: resolve, load, build from source when nothing
//! loads, then smoke-test the result. A fatal build failure exits the
//! process with the build's exit code.

use std::sync::Arc;

use anyhow::Result;
use sqlany_runtime::{CliProgress, SmokeOutcome, acquire_driver_or_exit, driver};
use tracing::debug;

use crate::context::CliContext;

pub async fn execute(ctx: &CliContext, skip_smoke_test: bool) -> Result<()> {
    let mut config = ctx.config.clone();
    if skip_smoke_test {
        config.smoke_test = false;
    }

    println!("Package root: {}", ctx.root_label());
    println!("Environment:  {}", config.fingerprint());
    println!();

    let acquired = acquire_driver_or_exit(&config, Arc::new(CliProgress::new())).await?;

    if let Some(handle) = driver() {
        debug!(path = %handle.path().display(), "Process-wide driver registered");
    }

    println!("Driver: {} ({})", acquired.path.display(), acquired.tier);
    if acquired.built {
        println!("✓ Built from source");
    }
    match &acquired.smoke {
        SmokeOutcome::Passed => println!("✓ Test connection created"),
        SmokeOutcome::Failed(reason) => println!("⚠ Test connection failed: {reason}"),
        SmokeOutcome::Skipped => {}
    }
    println!();
    println!("Install complete");
    Ok(())
}
