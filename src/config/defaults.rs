use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::ConnectionArgs;
use crate::http::DEFAULT_BASE_URL;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub dashboard_refresh_secs: u64,
    pub stats_refresh_secs: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dashboard_refresh_secs: 5,
            stats_refresh_secs: 3,
        }
    }
}

impl ExplorerConfig {
    pub fn main_key_prefix() -> &'static str {
        "explorer"
    }

    pub fn apply_connection(&mut self, args: &ConnectionArgs) {
        if let Some(base_url) = &args.base_url {
            self.base_url = base_url.clone();
        }
    }

    pub fn dashboard_refresh(&self) -> Duration {
        Duration::from_secs(self.dashboard_refresh_secs.max(1))
    }

    pub fn stats_refresh(&self) -> Duration {
        Duration::from_secs(self.stats_refresh_secs.max(1))
    }
}
