//! blobrelay - blob upload/download client
//!
//! Command-line front end for the blob transfer client.

use blobrelay::cli::Cli;
use blobrelay::config::{self, Config};
use blobrelay::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Log level comes from the merged config (file, env, flags)
    let mut config = match config::load_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    init_logging(&config);

    // Execute the command
    if let Err(e) = run(cli, config).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    info!("Starting blobrelay");

    config.validate()?;
    cli.execute(config).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
