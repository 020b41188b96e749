use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboard_controls::cli::Cli;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Application panicked: {}", panic_info);
        std::process::exit(1);
    }));

    // A missing .env is fine
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file found or error loading it: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.debug) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = cli.execute().await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) -> Result<()> {
    let default_filter = if debug {
        "dashboard_controls=debug"
    } else {
        "dashboard_controls=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
