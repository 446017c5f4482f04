//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use sqlany_runtime::AcquireError;
use tracing_subscriber::EnvFilter;

use sqlany_cli::{Cli, CliContext, Commands, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok();
}

/// Driver errors carry their own exit code; everything else exits 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<AcquireError>()
        .map_or(1, AcquireError::exit_code)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = CliContext::from_cli(&cli)?;

    match command {
        Commands::Fingerprint { json } => handlers::fingerprint::execute(&ctx.fingerprint(), *json),
        Commands::Resolve { json } => handlers::resolve::execute(&ctx, *json),
        Commands::Install { skip_smoke_test } => {
            handlers::install::execute(&ctx, *skip_smoke_test).await
        }
        Commands::Status => handlers::status::execute(&ctx),
        Commands::Clean { force } => handlers::clean::execute(&ctx, *force),
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables before anything reads SQLANY_*
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}
