use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Config;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One acquisition run's input. Immutable once the run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub location: String,
    pub target_count: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, location: impl Into<String>, target_count: usize) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            target_count,
        }
    }
}

/// A single scraped business listing. `map_url` is the identity key and the
/// only field required for the record to exist; everything else is
/// best-effort and stays `None` when the card doesn't carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub category: Option<String>,
    pub map_url: String,
}

impl BusinessRecord {
    pub fn with_map_url(map_url: impl Into<String>) -> Self {
        Self {
            name: None,
            address: None,
            phone: None,
            website: None,
            rating: None,
            review_count: None,
            category: None,
            map_url: map_url.into(),
        }
    }
}

/// What a finished run looks like on disk (JSON export).
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub search: SearchRequest,
    pub scraped_at: String,
    pub total_records: usize,
    pub skipped_entries: usize,
    pub aborted: bool,
    pub abort_reason: Option<String>,
    pub records: Vec<BusinessRecord>,
}

pub struct CliApp {
    pub config: Config,
    pub cancel: CancellationToken,
}
