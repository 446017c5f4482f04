//! Resolve command handler.
//!
//! Shows every tier location for the current environment in the order the
//! loader tries them, without loading anything.

use anyhow::Result;
use sqlany_runtime::{AcquireError, Resolution, plan};

use crate::context::CliContext;

pub fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    let fp = ctx.fingerprint();
    let layout = ctx.config.layout();

    let candidates = match plan(&fp, &layout) {
        Resolution::Unsupported { reason } => {
            if json {
                let value = serde_json::json!({
                    "fingerprint": fp.to_string(),
                    "supported": false,
                    "reason": reason,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            return Err(AcquireError::UnsupportedPlatform {
                fingerprint: fp,
                reason,
            }
            .into());
        }
        Resolution::Candidates(candidates) => candidates,
    };

    let rows: Vec<_> = candidates
        .iter()
        .map(|candidate| (candidate, candidate.exists()))
        .collect();

    if json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(candidate, exists)| {
                serde_json::json!({
                    "tier": candidate.tier,
                    "path": candidate.path,
                    "exists": exists,
                })
            })
            .collect();
        let value = serde_json::json!({
            "fingerprint": fp.to_string(),
            "root": ctx.root.path,
            "candidates": entries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Package root: {}", ctx.root_label());
    println!("Environment:  {fp}");
    println!();
    for (candidate, exists) in &rows {
        let mark = if *exists { "✓" } else { "✗" };
        println!(
            "  {mark} {:<20} {}",
            candidate.tier.as_str(),
            candidate.path.display()
        );
    }
    if !rows.iter().any(|(_, exists)| *exists) {
        println!();
        println!("No artifact found. Run 'sqlany install' to build one.");
    }
    Ok(())
}
