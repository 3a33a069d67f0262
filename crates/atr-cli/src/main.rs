use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;
mod output;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("atr error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();

    // Commands that never touch the store run without loading config.
    match &cli.command {
        cli::Commands::Classify(args) => return commands::classify::handle(args, &flags),
        cli::Commands::Messages => return commands::messages::handle(&flags),
        _ => {}
    }

    let config =
        atr_config::AtriumConfig::load_with_dotenv().context("failed to load atrium config")?;
    tracing::debug!(
        max_errors = config.errors.max_errors,
        max_attempts = config.retry.max_attempts,
        delay_ms = config.retry.delay_ms,
        "config loaded"
    );

    match cli.command {
        cli::Commands::Inspect(args) => commands::inspect::handle(&args, &config, &flags),
        cli::Commands::Check(args) => commands::check::handle(&args, &config, &flags).await,
        cli::Commands::Classify(_) | cli::Commands::Messages => Ok(()),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ATRIUM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
