//! CLI entry point.
//!
//! Parses arguments, installs logging, bootstraps a speech session and
//! dispatches to a handler. Errors carrying a [`CliError`] map to its exit
//! code; anything else exits with 1.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use questvoice_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli);

    if matches!(cli.command, Commands::Settings) {
        return handlers::settings::execute(&config);
    }

    let mut ctx = bootstrap(&config)?;
    let printer = ctx
        .events
        .take()
        .map(|events| handlers::spawn_event_printer(events, cli.events));

    let result = match &cli.command {
        Commands::Speak { text } => handlers::speak::execute(&ctx, text).await,
        Commands::Story { transcript, gap_ms } => {
            handlers::story::execute(&ctx, transcript, Duration::from_millis(*gap_ms)).await
        }
        Commands::Settings => Ok(()),
    };

    ctx.session.dispose();
    drop(ctx);
    if let Some(printer) = printer {
        // Flush events emitted during teardown
        let _ = tokio::time::timeout(Duration::from_millis(250), printer).await;
    }
    result
}
