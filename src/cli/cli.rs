use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::models::CliApp;

#[derive(Debug, Clone)]
pub enum MenuAction {
    ScrapeSearch,
    RunBatch,
    DebugEnvironmentCheck,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::ScrapeSearch => {
                write!(f, "🗺️  Scrape businesses for one Google Maps search")
            }
            MenuAction::RunBatch => {
                write!(f, "📚 Run every search in searches.yml")
            }
            MenuAction::DebugEnvironmentCheck => write!(f, "🔍 Debug Environment Check"),
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

impl CliApp {
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }
}
