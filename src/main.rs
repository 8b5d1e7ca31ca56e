// src/main.rs
use models::{CliApp, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod acquisition;
mod cli;
mod config;
mod driver;
mod export;
mod models;

use config::{load_config, Config};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("maps_scraper={}", config.logging.level)
                    .parse()
                    .unwrap_or_else(|_| "maps_scraper=info".parse().unwrap()),
            ),
        )
        .init();

    // Create output directory
    tokio::fs::create_dir_all(&config.output.directory).await?;

    // Ctrl+C asks the engine to drain instead of killing the run mid-entry
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, finishing the current entry before draining...");
                cancel.cancel();
            }
        });
    }

    let app = CliApp::new(config, cancel);
    app.run().await
}
