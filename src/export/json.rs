// src/export/json.rs
use std::path::Path;

use tracing::info;

use crate::models::{Result, RunSummary};

pub struct JsonExporter {
    pretty: bool,
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub async fn export(&self, summary: &RunSummary, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = if self.pretty {
            serde_json::to_string_pretty(summary)?
        } else {
            serde_json::to_string(summary)?
        };
        tokio::fs::write(path, json).await?;

        info!(
            "💾 Saved run {} ({} records) to {}",
            summary.run_id,
            summary.total_records,
            path.display()
        );
        Ok(())
    }
}
