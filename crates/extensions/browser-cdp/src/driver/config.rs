//! Driver configuration.

use std::path::PathBuf;

use fanout_config::BrowserConfig;

/// Configuration for [`CdpTabDriver`](super::CdpTabDriver).
#[derive(Debug, Clone)]
pub struct CdpDriverConfig {
    /// DevTools HTTP endpoint, e.g. `http://localhost:9222`.
    pub endpoint: String,
    /// Directory scraper scripts are read from.
    pub scripts_dir: PathBuf,
}

impl Default for CdpDriverConfig {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for CdpDriverConfig {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            scripts_dir: config.scripts_dir.clone(),
        }
    }
}
