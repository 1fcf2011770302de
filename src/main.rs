//! Command-line client for the Sony Ci media cloud.
//!
//! Credentials come from flags or environment variables; results are
//! printed to stdout as JSON or plain text.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sony_ci_api::config::{Command, Config};
use sony_ci_api::SonyCiAdmin;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("API host: {}", config.api_base);
    tracing::debug!("IO host: {}", config.io_base);

    let ci = SonyCiAdmin::with_options(config.credentials(), config.client_options()?)?;

    match config.command {
        Command::Upload { path, log } => {
            let asset_id = ci.upload(&path, &log).await?;
            println!("{}", asset_id);
        }
        Command::List { limit, offset } => {
            let items = ci.list(limit, offset).await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Command::Detail { id } => {
            let details = ci.detail(&id).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Command::Delete { id } => {
            ci.delete(&id).await?;
            tracing::info!("Deleted {}", id);
        }
        Command::Download { id } => {
            println!("{}", ci.download(&id).await?);
        }
    }

    Ok(())
}
