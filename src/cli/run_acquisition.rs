// src/cli/run_acquisition.rs
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, warn};

use crate::acquisition::{AcquisitionEngine, AcquisitionReport};
use crate::driver::ChromiumDriver;
use crate::export::{CsvExporter, JsonExporter, SheetsExporter};
use crate::models::{CliApp, Result, RunSummary, SearchRequest};

impl CliApp {
    /// One full session: launch the browser, open the search, run the
    /// engine, tear the browser down. The engine itself never touches
    /// session lifecycle.
    pub async fn run_acquisition(&self, request: &SearchRequest) -> Result<AcquisitionReport> {
        let driver = ChromiumDriver::launch(&self.config.browser, &self.config.acquisition).await?;
        let page_load = Duration::from_secs(self.config.browser.page_load_timeout_secs);

        let report = match driver.open_search(request, page_load).await {
            Ok(()) => {
                let engine = AcquisitionEngine::new(&driver, &self.config, self.cancel.clone());
                engine.run(request).await
            }
            Err(e) => {
                let _ = driver.close().await;
                return Err(e);
            }
        };

        driver.close().await?;
        Ok(report)
    }

    /// Persist a finished run: CSV + JSON always, Sheets when configured.
    pub async fn export_report(
        &self,
        request: &SearchRequest,
        report: &AcquisitionReport,
    ) -> Result<()> {
        if report.records.is_empty() {
            println!("\n❌ No businesses found. Try adjusting your search terms.");
            return Ok(());
        }

        let stem = format!(
            "{}_{}_{}",
            slug(&request.query),
            slug(&request.location),
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let out_dir = Path::new(&self.config.output.directory);

        CsvExporter::new()
            .export(&report.records, &out_dir.join(format!("{stem}.csv")))
            .await?;

        let summary = RunSummary {
            run_id: report.run_id.clone(),
            search: request.clone(),
            scraped_at: Utc::now().to_rfc3339(),
            total_records: report.records.len(),
            skipped_entries: report.skipped,
            aborted: report.aborted,
            abort_reason: report.abort_reason.clone(),
            records: report.records.clone(),
        };
        JsonExporter::new(self.config.output.pretty_json)
            .export(&summary, &out_dir.join(format!("{stem}.json")))
            .await?;

        if let Some(sheet_id) = &self.config.sheets.spreadsheet_id {
            match SheetsExporter::from_env(sheet_id) {
                Ok(exporter) => {
                    if let Err(e) = exporter.append_records(&report.records).await {
                        error!("❌ Sheets upload failed: {}", e);
                    }
                }
                Err(e) => warn!("Skipping Sheets upload: {}", e),
            }
        }

        self.print_summary(report);
        Ok(())
    }

    fn print_summary(&self, report: &AcquisitionReport) {
        println!("\n📊 Summary:");
        println!("Total businesses scraped: {}", report.records.len());
        println!("Skipped entries: {}", report.skipped);
        println!("Run time: {:.1}s", report.duration_ms as f64 / 1000.0);
        if report.aborted {
            println!(
                "⚠️  Run gave up early: {}",
                report.abort_reason.as_deref().unwrap_or("unknown failure")
            );
        }

        if let Some(sample) = report.records.first() {
            println!("\n📝 Sample record:");
            let fields = [
                ("name", sample.name.as_deref()),
                ("address", sample.address.as_deref()),
                ("phone", sample.phone.as_deref()),
                ("website", sample.website.as_deref()),
                ("category", sample.category.as_deref()),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    println!("  {}: {}", label, value);
                }
            }
            if let Some(rating) = sample.rating {
                println!("  rating: {}", rating);
            }
            if let Some(count) = sample.review_count {
                println!("  reviews: {}", count);
            }
            println!("  map_url: {}", sample.map_url);
        }
    }
}

fn slug(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    slug.trim_matches('_').to_string()
}
