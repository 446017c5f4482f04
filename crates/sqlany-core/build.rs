//! Build script for sqlany-core.
//!
//! Sets `SQLANY_HOST_RUNTIME_VERSION` to the release of the compiler building
//! this crate. Prebuilt driver artifacts are keyed on that version.

use std::env;
use std::process::Command;

fn main() {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    // "rustc 1.85.0 (4d91de4e4 2025-02-17)" -> "1.85.0"
    // "rustc 1.86.0-nightly (...)" -> "1.86.0"
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| {
            let stdout = String::from_utf8_lossy(&output.stdout);
            stdout
                .split_whitespace()
                .nth(1)
                .and_then(|v| v.split('-').next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=SQLANY_HOST_RUNTIME_VERSION={version}");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RUSTC");
}
