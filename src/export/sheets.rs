// src/export/sheets.rs
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::models::{BusinessRecord, Result};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Appends finished runs to a Google Sheet through the values API.
///
/// Authentication is a ready OAuth bearer token from the environment;
/// obtaining and refreshing it is the operator's problem, same as any
/// other credential this tool consumes.
pub struct SheetsExporter {
    client: Client,
    spreadsheet_id: String,
    token: String,
}

impl SheetsExporter {
    pub fn from_env(spreadsheet_id: &str) -> Result<Self> {
        let token = std::env::var("GOOGLE_SHEETS_TOKEN")
            .map_err(|_| "GOOGLE_SHEETS_TOKEN not set; skipping Sheets upload requires it")?;

        Ok(Self {
            client: Client::new(),
            spreadsheet_id: spreadsheet_id.to_string(),
            token,
        })
    }

    pub async fn append_records(&self, records: &[BusinessRecord]) -> Result<()> {
        if records.is_empty() {
            debug!("No records to upload, skipping Sheets call");
            return Ok(());
        }

        let mut values: Vec<Vec<String>> = Vec::with_capacity(records.len() + 1);
        values.push(
            ["name", "address", "phone", "website", "rating", "review_count", "category", "map_url"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        for record in records {
            values.push(vec![
                record.name.clone().unwrap_or_default(),
                record.address.clone().unwrap_or_default(),
                record.phone.clone().unwrap_or_default(),
                record.website.clone().unwrap_or_default(),
                record.rating.map(|r| r.to_string()).unwrap_or_default(),
                record.review_count.map(|c| c.to_string()).unwrap_or_default(),
                record.category.clone().unwrap_or_default(),
                record.map_url.clone(),
            ]);
        }

        let url = format!(
            "{}/{}/values/A1:append?valueInputOption=RAW",
            SHEETS_API_BASE, self.spreadsheet_id
        );
        debug!("Appending {} rows to spreadsheet {}", values.len(), self.spreadsheet_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": values }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Sheets API error {status}: {body}").into());
        }

        info!(
            "📤 Uploaded {} records to spreadsheet {}",
            records.len(),
            self.spreadsheet_id
        );
        Ok(())
    }
}
