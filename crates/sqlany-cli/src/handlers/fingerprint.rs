//! Fingerprint command handler.

use anyhow::Result;
use sqlany_core::EnvironmentFingerprint;

/// Print the environment fingerprint used for artifact lookup.
pub fn execute(fp: &EnvironmentFingerprint, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "platform": fp.os.as_str(),
            "arch": fp.arch.as_str(),
            "runtime": fp.runtime.to_string(),
            "supported": fp.is_supported(),
            "reason": fp.unsupported_reason(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Platform:     {}", fp.os);
    println!("Architecture: {}", fp.arch);
    println!("Runtime:      {}", fp.runtime);
    match fp.unsupported_reason() {
        None => println!("Supported:    ✓ yes"),
        Some(reason) => println!("Supported:    ✗ no ({reason})"),
    }
    Ok(())
}
