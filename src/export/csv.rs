// src/export/csv.rs
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::models::{BusinessRecord, Result};

/// Column order is part of the contract with downstream consumers.
pub const CSV_HEADER: &str = "name,address,phone,website,rating,review_count,category,map_url";

pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }

    pub async fn export(&self, records: &[BusinessRecord], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        writeln!(file, "{}", CSV_HEADER)?;

        for record in records {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{}",
                csv_cell(record.name.as_deref()),
                csv_cell(record.address.as_deref()),
                csv_cell(record.phone.as_deref()),
                csv_cell(record.website.as_deref()),
                record.rating.map(|r| r.to_string()).unwrap_or_default(),
                record
                    .review_count
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
                csv_cell(record.category.as_deref()),
                csv_cell(Some(&record.map_url)),
            )?;
        }

        info!("💾 Saved {} records to {}", records.len(), path.display());
        Ok(())
    }
}

/// A missing field is an empty cell, never a placeholder that could pass
/// for data. Values with commas, quotes or newlines get RFC 4180 quoting.
fn csv_cell(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, address: Option<&str>) -> BusinessRecord {
        let mut record = BusinessRecord::with_map_url("https://maps.example/place/1");
        record.name = name.map(String::from);
        record.address = address.map(String::from);
        record
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(csv_cell(Some("Joe's Diner")), "Joe's Diner");
        assert_eq!(
            csv_cell(Some("123 Main St, Duluth, MN")),
            "\"123 Main St, Duluth, MN\""
        );
        assert_eq!(csv_cell(Some("The \"Best\" Cafe")), "\"The \"\"Best\"\" Cafe\"");
        assert_eq!(csv_cell(None), "");
    }

    #[tokio::test]
    async fn none_fields_become_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("businesses.csv");

        let records = vec![record(Some("Lone Pine"), None)];
        CsvExporter::new().export(&records, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("Lone Pine,,,,,,,https://maps.example/place/1")
        );
    }

    #[tokio::test]
    async fn commas_in_addresses_stay_in_one_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("businesses.csv");

        let records = vec![record(Some("Cafe"), Some("1 Elm St, Duluth, MN 55802"))];
        CsvExporter::new().export(&records, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"1 Elm St, Duluth, MN 55802\""));
    }
}
