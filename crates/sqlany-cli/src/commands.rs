//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the detected platform, architecture and runtime version
    Fingerprint {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every artifact location for this environment and whether it exists
    Resolve {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the driver, building it from source if no artifact loads
    Install {
        /// Skip creating a test connection after loading
        #[arg(long)]
        skip_smoke_test: bool,
    },

    /// Show which artifact would be used and the last local build
    Status,

    /// Remove the local build output
    Clean {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}
