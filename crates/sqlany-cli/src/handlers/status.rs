//! Status command handler.

use anyhow::Result;
use sqlany_runtime::{BuildRecord, Resolution, resolve};

use crate::context::CliContext;

/// Show which artifact the loader would try first and the last local build.
///
/// Nothing is loaded; a present artifact may still fail to open.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let fp = ctx.fingerprint();
    let layout = ctx.config.layout();

    println!("Package root: {}", ctx.root_label());
    println!("Environment:  {fp}");

    match resolve(&fp, &layout) {
        Resolution::Unsupported { reason } => {
            println!("Status: Unsupported ({reason})");
            return Ok(());
        }
        Resolution::Candidates(candidates) => match candidates.first() {
            Some(first) => {
                println!("Status: Available");
                println!("Artifact: {} ({})", first.path.display(), first.tier);
                if candidates.len() > 1 {
                    println!("Fallbacks: {}", candidates.len() - 1);
                }
            }
            None => {
                println!("Status: Not installed");
                println!();
                println!("Run 'sqlany install' to build the driver from source");
            }
        },
    }

    let record_path = layout.build_record_path();
    if record_path.is_file() {
        match BuildRecord::load(&record_path) {
            Ok(record) => {
                println!();
                println!("Last local build:");
                println!("  Built: {}", record.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("  For: {}", record.fingerprint);
                println!("  Configure: {}", record.configure_command);
                println!("  Build: {}", record.build_command);
                if record.fingerprint != fp {
                    println!("  ⚠ Built for a different environment");
                }
            }
            Err(e) => println!("Build record unreadable: {e}"),
        }
    }
    Ok(())
}
