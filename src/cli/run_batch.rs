// src/cli/run_batch.rs
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::models::{CliApp, Result, SearchRequest};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchSearch {
    pub query: String,
    pub location: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    pub searches: Vec<BatchSearch>,
}

pub async fn load_batch_from_yaml(path: &str) -> Result<BatchConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: BatchConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

impl CliApp {
    pub async fn run_batch(&self) -> Result<()> {
        let batch = load_batch_from_yaml("searches.yml").await?;

        if batch.searches.is_empty() {
            println!("❌ searches.yml contains no searches");
            return Ok(());
        }

        info!("🚀 Starting batch of {} searches", batch.searches.len());
        let mut completed = 0usize;

        for (i, search) in batch.searches.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("🛑 Batch interrupted after {} searches", completed);
                break;
            }

            println!(
                "\n[{}/{}] '{}' in '{}'",
                i + 1,
                batch.searches.len(),
                search.query,
                search.location
            );

            let request = SearchRequest::new(
                &search.query,
                &search.location,
                search
                    .max_results
                    .unwrap_or(self.config.acquisition.default_target_count),
            );

            // one failed search never takes the batch down
            match self.run_acquisition(&request).await {
                Ok(report) => {
                    completed += 1;
                    if let Err(e) = self.export_report(&request, &report).await {
                        error!("❌ Export failed for '{}': {}", search.query, e);
                    }
                }
                Err(e) => {
                    error!("❌ Search '{}' failed: {}", search.query, e);
                }
            }
        }

        info!(
            "🏁 Batch complete: {}/{} searches",
            completed,
            batch.searches.len()
        );
        Ok(())
    }
}
