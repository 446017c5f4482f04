//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Locate, build and check the SQL Anywhere native driver.
#[derive(Parser)]
#[command(name = "sqlany")]
#[command(about = "Locate, build and check the SQL Anywhere native driver")]
#[command(version)]
pub struct Cli {
    /// Package root holding prebuild/, bin64/, bin32/ and build/
    /// (defaults to SQLANY_ROOT, then the current directory)
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// Runtime version to resolve for instead of the detected one (e.g. v16.2.0)
    #[arg(long = "runtime-version", global = true)]
    pub runtime_version: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "sqlany",
            "resolve",
            "--root",
            "/opt/sqlany",
            "--runtime-version",
            "v14.0.0",
            "--json",
        ]);
        assert_eq!(cli.root.as_deref(), Some("/opt/sqlany"));
        assert_eq!(cli.runtime_version.as_deref(), Some("v14.0.0"));
        assert!(matches!(cli.command, Some(Commands::Resolve { json: true })));
    }

    #[test]
    fn test_clean_force_flag() {
        let cli = Cli::parse_from(["sqlany", "clean", "-f"]);
        assert!(matches!(cli.command, Some(Commands::Clean { force: true })));
    }

    #[test]
    fn test_root_is_left_unset_without_the_flag() {
        // SQLANY_ROOT is read by the package root resolver so it is reported
        // as the env source, not as an explicit flag.
        let cli = Cli::parse_from(["sqlany", "status"]);
        assert!(cli.root.is_none());
    }
}
