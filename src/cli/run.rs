use dialoguer::{theme::ColorfulTheme, Select};

use crate::{
    cli::cli::MenuAction,
    models::{CliApp, Result},
};
use tracing::error;

impl CliApp {
    pub async fn run(&self) -> Result<()> {
        println!("\n🗺️  Welcome to Maps Scraper!");
        println!("═══════════════════════════════════════");

        loop {
            if self.cancel.is_cancelled() {
                println!("\n👋 Shutting down");
                break;
            }

            let actions = vec![
                MenuAction::ScrapeSearch,
                MenuAction::RunBatch,
                MenuAction::DebugEnvironmentCheck,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::ScrapeSearch => {
                    if let Err(e) = self.run_search().await {
                        error!("Search failed: {}", e);
                    }
                }
                MenuAction::RunBatch => {
                    if let Err(e) = self.run_batch().await {
                        error!("Batch run failed: {}", e);
                    }
                }
                MenuAction::DebugEnvironmentCheck => {
                    if let Err(e) = self.debug_environment_check().await {
                        error!("Debug environment check failed: {}", e);
                    }
                }
                MenuAction::Exit => {
                    println!("\n👋 Thanks for using Maps Scraper!");
                    break;
                }
            }
        }

        Ok(())
    }
}
