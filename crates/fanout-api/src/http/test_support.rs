//! Mock tab driver shared by the unit tests of this crate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use fanout_core::{Coordinator, CoordinatorSettings, PlatformRegistry};
use fanout_protocols::{BrowserError, PlatformTarget, TabDriver, TabInfo};

/// Driver with a ChatGPT and a Gemini tab. Every delivered prompt is sent
/// to `deliveries`.
pub(crate) struct MockDriver {
    tabs: Vec<TabInfo>,
    deliveries: mpsc::UnboundedSender<(String, String)>,
}

#[async_trait]
impl TabDriver for MockDriver {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError> {
        Ok(self.tabs.clone())
    }

    async fn active_tab(&self) -> Result<Option<TabInfo>, BrowserError> {
        Ok(self.tabs.first().cloned())
    }

    async fn activate(&self, _id: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn inject_scraper(&self, _tab: &str, _target: &PlatformTarget) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn deliver_prompt(&self, _tab: &str, platform: &str, prompt: &str) -> Result<(), BrowserError> {
        let _ = self.deliveries.send((platform.to_string(), prompt.to_string()));
        Ok(())
    }
}

pub(crate) fn fast_settings() -> CoordinatorSettings {
    CoordinatorSettings {
        settle_delay: Duration::from_millis(5),
        result_delay: Duration::from_millis(5),
        restore_delay: Duration::from_millis(5),
        query_timeout: Duration::from_secs(5),
        event_capacity: 64,
    }
}

fn tabs() -> Vec<TabInfo> {
    vec![
        TabInfo::new("1", "https://example.org/", "Example"),
        TabInfo::new("2", "https://chatgpt.com/", "ChatGPT"),
        TabInfo::new("3", "https://gemini.google.com/app", "Gemini"),
    ]
}

fn build() -> (Coordinator, mpsc::UnboundedReceiver<(String, String)>) {
    let (deliveries, rx) = mpsc::unbounded_channel();
    let driver = Arc::new(MockDriver {
        tabs: tabs(),
        deliveries,
    });
    let coordinator = Coordinator::new(
        Arc::new(PlatformRegistry::with_builtin()),
        driver,
        fast_settings(),
    );
    (coordinator, rx)
}

/// Coordinator whose queries never get an answer.
pub(crate) fn idle_coordinator() -> Coordinator {
    build().0
}

/// Coordinator whose scrapers answer every prompt with progress
/// `"thinking"` then final `"<platform>: <prompt>"`.
pub(crate) fn echo_coordinator() -> Coordinator {
    let (coordinator, mut deliveries) = build();
    let scraper = coordinator.clone();
    tokio::spawn(async move {
        while let Some((platform, prompt)) = deliveries.recv().await {
            scraper.report_progress(&platform, "thinking");
            scraper.report_final(&platform, format!("{}: {}", platform, prompt));
        }
    });
    coordinator
}
