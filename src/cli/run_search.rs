// src/cli/run_search.rs
use dialoguer::{theme::ColorfulTheme, Input};

use crate::models::{CliApp, Result, SearchRequest};

impl CliApp {
    pub async fn run_search(&self) -> Result<()> {
        println!("\n🗺️  Google Maps Business Search");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let query: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Business type to search for (e.g. 'coffee shops')")
            .interact_text()?;

        let location: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Location (e.g. 'Seattle, WA')")
            .interact_text()?;

        let target_count: usize = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("How many results")
            .default(self.config.acquisition.default_target_count)
            .interact_text()?;

        if query.trim().is_empty() || location.trim().is_empty() || target_count == 0 {
            println!("❌ Query, location and a positive result count are required");
            return Ok(());
        }

        let request = SearchRequest::new(query.trim(), location.trim(), target_count);
        let report = self.run_acquisition(&request).await?;
        self.export_report(&request, &report).await?;

        Ok(())
    }
}
