use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub browser: BrowserConfig,
    pub acquisition: AcquisitionConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Explicit chrome binary; when unset the driver probes env and PATH.
    pub binary_path: Option<String>,
    pub page_load_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Upper bound on any single driver call.
    pub per_op_timeout_ms: u64,
    /// How long a reveal may take to change the visible entry count.
    pub settle_timeout_ms: u64,
    pub settle_poll_ms: u64,
    /// Consecutive surface failures before the run gives up.
    pub abort_threshold: u32,
    pub default_target_count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub min_action_spacing_ms: u64,
    pub batch_size: usize,
    pub batch_pause_min_ms: u64,
    pub batch_pause_max_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub progress_interval: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub directory: String,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser: BrowserConfig {
                headless: true,
                binary_path: None,
                page_load_timeout_secs: 20,
            },
            acquisition: AcquisitionConfig {
                per_op_timeout_ms: 10_000,
                settle_timeout_ms: 8_000,
                settle_poll_ms: 500,
                abort_threshold: 3,
                default_target_count: 50,
            },
            rate_limit: RateLimitConfig {
                min_action_spacing_ms: 2_000,
                batch_size: 10,
                batch_pause_min_ms: 5_000,
                batch_pause_max_ms: 10_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                progress_interval: 10,
            },
            output: OutputConfig {
                directory: "out".to_string(),
                pretty_json: true,
            },
            sheets: SheetsConfig {
                spreadsheet_id: None,
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scraper_pacing() {
        let config = Config::default();
        assert_eq!(config.rate_limit.min_action_spacing_ms, 2_000);
        assert_eq!(config.rate_limit.batch_size, 10);
        assert!(config.rate_limit.batch_pause_min_ms <= config.rate_limit.batch_pause_max_ms);
        assert_eq!(config.acquisition.abort_threshold, 3);
    }

    #[test]
    fn parses_overrides_from_yaml() {
        let yaml = r#"
browser:
  headless: false
  binary_path: /usr/bin/chromium
  page_load_timeout_secs: 30
acquisition:
  per_op_timeout_ms: 5000
  settle_timeout_ms: 4000
  settle_poll_ms: 250
  abort_threshold: 5
  default_target_count: 20
rate_limit:
  min_action_spacing_ms: 1500
  batch_size: 8
  batch_pause_min_ms: 3000
  batch_pause_max_ms: 6000
logging:
  level: debug
  progress_interval: 5
output:
  directory: data
  pretty_json: false
sheets:
  spreadsheet_id: abc123
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.acquisition.abort_threshold, 5);
        assert_eq!(config.rate_limit.batch_size, 8);
        assert_eq!(config.sheets.spreadsheet_id.as_deref(), Some("abc123"));
    }
}
