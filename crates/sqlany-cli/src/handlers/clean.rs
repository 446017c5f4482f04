//! Clean command handler.

use std::fs;

use anyhow::{Context, Result};

use crate::context::CliContext;
use crate::utils::input;

/// Remove `build/Release` under the package root.
///
/// Prebuilt artifacts are never touched.
pub fn execute(ctx: &CliContext, force: bool) -> Result<()> {
    let dir = ctx.config.layout().local_build_dir();
    if !dir.exists() {
        println!("Nothing to clean: {} does not exist", dir.display());
        return Ok(());
    }

    if !force {
        let confirm = input::prompt_confirmation(&format!("Remove {}?", dir.display()))?;
        if !confirm {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    println!("✓ Removed {}", dir.display());
    Ok(())
}
