//! Tab driver protocol.
//!
//! The tab driver is the coordinator's only handle on the browser: it lists
//! tabs, switches the foreground tab, injects scraper scripts and forwards
//! the prompt to an injected scraper. The coordinator owns every decision
//! about *when* those happen; drivers never switch tabs on their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BrowserError;
use crate::platform::PlatformTarget;

/// Browser tab identifier type.
pub type TabId = String;

/// A browser tab as seen by the tab driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    pub title: String,
}

impl TabInfo {
    pub fn new(id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Core trait for browser tab drivers.
#[async_trait]
pub trait TabDriver: Send + Sync {
    /// List every open page tab.
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError>;

    /// The tab currently in the foreground, if the driver can tell.
    async fn active_tab(&self) -> Result<Option<TabInfo>, BrowserError>;

    /// Look up a tab by ID. `Ok(None)` means the tab was closed.
    async fn get_tab(&self, id: &str) -> Result<Option<TabInfo>, BrowserError> {
        Ok(self.list_tabs().await?.into_iter().find(|tab| tab.id == id))
    }

    /// Bring a tab to the foreground.
    async fn activate(&self, id: &str) -> Result<(), BrowserError>;

    /// Inject the platform's scraper script into a tab.
    async fn inject_scraper(&self, tab: &str, target: &PlatformTarget) -> Result<(), BrowserError>;

    /// Send `startQuery(prompt)` to the scraper injected into a tab.
    async fn deliver_prompt(&self, tab: &str, platform: &str, prompt: &str)
    -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticDriver {
        tabs: Vec<TabInfo>,
    }

    #[async_trait]
    impl TabDriver for StaticDriver {
        async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError> {
            Ok(self.tabs.clone())
        }

        async fn active_tab(&self) -> Result<Option<TabInfo>, BrowserError> {
            Ok(self.tabs.first().cloned())
        }

        async fn activate(&self, _id: &str) -> Result<(), BrowserError> {
            Ok(())
        }

        async fn inject_scraper(
            &self,
            _tab: &str,
            _target: &PlatformTarget,
        ) -> Result<(), BrowserError> {
            Ok(())
        }

        async fn deliver_prompt(
            &self,
            _tab: &str,
            _platform: &str,
            _prompt: &str,
        ) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_get_tab() {
        let driver = StaticDriver {
            tabs: vec![
                TabInfo::new("1", "https://chatgpt.com/", "ChatGPT"),
                TabInfo::new("2", "https://example.com/", "Example"),
            ],
        };

        let tab = driver.get_tab("2").await.unwrap();
        assert_eq!(tab.unwrap().title, "Example");
        assert!(driver.get_tab("3").await.unwrap().is_none());
    }

    #[test]
    fn test_tab_info_serialization() {
        let tab = TabInfo::new("7", "https://kimi.moonshot.cn/", "Kimi");
        let json = serde_json::to_string(&tab).unwrap();
        assert!(json.contains("\"id\":\"7\""));
        assert!(json.contains("Kimi"));
    }
}
