// src/cli/debug_check.rs
use crate::driver::chromium::find_chromium;
use crate::models::{CliApp, Result};

impl CliApp {
    pub async fn debug_environment_check(&self) -> Result<()> {
        println!("\n🔍 Environment Check");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        match find_chromium(&self.config.browser) {
            Some(path) => println!("✅ Chrome binary: {}", path.display()),
            None => println!(
                "❌ Chrome binary not found (set MAPS_SCRAPER_CHROME or browser.binary_path)"
            ),
        }

        match &self.config.sheets.spreadsheet_id {
            Some(id) => {
                println!("✅ Sheets upload configured: {}", id);
                if std::env::var("GOOGLE_SHEETS_TOKEN").is_ok() {
                    println!("✅ GOOGLE_SHEETS_TOKEN is set");
                } else {
                    println!("❌ GOOGLE_SHEETS_TOKEN is not set");
                }
            }
            None => println!("ℹ️  Sheets upload not configured (sheets.spreadsheet_id)"),
        }

        match tokio::fs::create_dir_all(&self.config.output.directory).await {
            Ok(()) => println!("✅ Output directory: {}", self.config.output.directory),
            Err(e) => println!("❌ Output directory {}: {}", self.config.output.directory, e),
        }

        println!("\n⚙️  Pacing:");
        println!(
            "   min action spacing: {}ms",
            self.config.rate_limit.min_action_spacing_ms
        );
        println!(
            "   batch pause: {}-{}ms every {} entries",
            self.config.rate_limit.batch_pause_min_ms,
            self.config.rate_limit.batch_pause_max_ms,
            self.config.rate_limit.batch_size
        );
        println!(
            "   headless: {}",
            if self.config.browser.headless { "yes" } else { "no" }
        );

        Ok(())
    }
}
