//! [`TabDriver`] over a running Chrome.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, trace, warn};

use fanout_protocols::{BrowserError, PlatformTarget, ScrapeReport, TabDriver, TabInfo};

use super::bridge::{
    REPORT_BINDING, bridge_script, is_loaded_script, mark_loaded_script, start_query_script,
};
use super::config::CdpDriverConfig;
use crate::cdp::{BindingCalled, CdpClient, CdpError, CdpResponse, DevToolsHttp, PageInfo, PageSession};

const VISIBLE_EXPR: &str = "document.visibilityState === 'visible'";

/// Tab driver attached to the user's Chrome through remote debugging.
///
/// Tab listing and activation go through the DevTools HTTP endpoints. The
/// browser WebSocket is opened lazily and reopened if Chrome restarts. Tabs
/// that receive a scraper keep a cached session with the report binding;
/// other tabs are only ever touched through short-lived sessions.
pub struct CdpTabDriver {
    config: CdpDriverConfig,
    http: DevToolsHttp,
    client: RwLock<Option<Arc<CdpClient>>>,
    sessions: Mutex<HashMap<String, Arc<PageSession>>>,
    reports: mpsc::UnboundedSender<ScrapeReport>,
}

impl CdpTabDriver {
    /// Create a driver and the stream of scraper reports it collects.
    ///
    /// Reports should be forwarded to the coordinator's `handle_report`.
    pub fn new(config: CdpDriverConfig) -> (Self, mpsc::UnboundedReceiver<ScrapeReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        let driver = Self {
            http: DevToolsHttp::new(&config.endpoint),
            config,
            client: RwLock::new(None),
            sessions: Mutex::new(HashMap::new()),
            reports,
        };
        (driver, rx)
    }

    pub fn config(&self) -> &CdpDriverConfig {
        &self.config
    }

    async fn client(&self) -> Result<Arc<CdpClient>, CdpError> {
        {
            let client = self.client.read().await;
            if let Some(client) = client.as_ref().filter(|c| !c.is_closed()) {
                return Ok(client.clone());
            }
        }

        let mut slot = self.client.write().await;
        if let Some(client) = slot.as_ref().filter(|c| !c.is_closed()) {
            return Ok(client.clone());
        }

        if slot.take().is_some() {
            info!("Browser connection lost, reconnecting to {}", self.config.endpoint);
            self.sessions.lock().await.clear();
        }

        let client = Arc::new(CdpClient::connect(&self.config.endpoint).await?);
        info!("Connected to Chrome at {}", self.config.endpoint);
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Attached session for a tab, with the report binding installed.
    ///
    /// The session map stays locked while attaching so a tab never gets two
    /// sessions (and every report twice).
    async fn session(&self, tab: &str) -> Result<Arc<PageSession>, CdpError> {
        let client = self.client().await?;
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(tab) {
            return Ok(session.clone());
        }

        let (session, events) = client.attach_page(tab).await?;
        session.enable_runtime().await?;
        session.add_binding(REPORT_BINDING).await?;
        spawn_report_pump(tab.to_string(), events, self.reports.clone());

        let session = Arc::new(session);
        sessions.insert(tab.to_string(), session.clone());
        Ok(session)
    }

    /// Evaluate in a tab, dropping the cached session if the tab is gone.
    async fn evaluate(&self, tab: &str, expression: &str) -> Result<Value, CdpError> {
        let session = self.session(tab).await?;
        let result = session.evaluate(expression).await;
        if matches!(
            result,
            Err(CdpError::Protocol { .. } | CdpError::SessionClosed | CdpError::Timeout(_))
        ) {
            debug!("Dropping session for tab {}", tab);
            self.sessions.lock().await.remove(tab);
            if let Err(e) = session.detach().await {
                trace!("Detach from tab {} failed: {}", tab, e);
            }
        }
        result
    }

    /// Evaluate through a short-lived session, without the report binding.
    async fn evaluate_detached(&self, tab: &str, expression: &str) -> Result<Value, CdpError> {
        let client = self.client().await?;
        let (session, _events) = client.attach_page(tab).await?;
        let result = session.evaluate(expression).await;
        if let Err(e) = session.detach().await {
            trace!("Detach from tab {} failed: {}", tab, e);
        }
        result
    }

    /// Detach cached sessions whose tab is no longer listed.
    async fn prune_sessions(&self, pages: &[PageInfo]) {
        let stale: Vec<Arc<PageSession>> = {
            let mut sessions = self.sessions.lock().await;
            let closed: Vec<String> = sessions
                .keys()
                .filter(|tab| !pages.iter().any(|page| &page.id == *tab))
                .cloned()
                .collect();
            closed.iter().filter_map(|tab| sessions.remove(tab)).collect()
        };

        for session in stale {
            debug!("Tab {} closed, dropping its session", session.target_id());
            if let Err(e) = session.detach().await {
                trace!("Detach from tab {} failed: {}", session.target_id(), e);
            }
        }
    }

    async fn is_visible(&self, tab: &str) -> bool {
        let cached = self.sessions.lock().await.contains_key(tab);
        let result = if cached {
            self.evaluate(tab, VISIBLE_EXPR).await
        } else {
            self.evaluate_detached(tab, VISIBLE_EXPR).await
        };
        match result {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => {
                trace!("Visibility check failed for tab {}: {}", tab, e);
                false
            }
        }
    }
}

fn tab_info(page: PageInfo) -> TabInfo {
    TabInfo::new(page.id, page.url, page.title)
}

/// Forward `Runtime.bindingCalled` events for the report binding.
fn spawn_report_pump(
    tab: String,
    mut events: mpsc::UnboundedReceiver<CdpResponse>,
    reports: mpsc::UnboundedSender<ScrapeReport>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if event.method.as_deref() != Some("Runtime.bindingCalled") {
                continue;
            }
            let Some(params) = event.params else {
                continue;
            };
            let binding: BindingCalled = match serde_json::from_value(params) {
                Ok(binding) => binding,
                Err(e) => {
                    warn!("Malformed bindingCalled event from tab {}: {}", tab, e);
                    continue;
                }
            };
            if binding.name != REPORT_BINDING {
                continue;
            }

            match ScrapeReport::from_payload(&binding.payload) {
                Ok(report) => {
                    trace!("Report from tab {}: {:?}", tab, report);
                    if reports.send(report).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Ignoring malformed scraper report from tab {}: {}", tab, e),
            }
        }
        debug!("Report pump for tab {} stopped", tab);
    });
}

#[async_trait]
impl TabDriver for CdpTabDriver {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError> {
        let pages = self.http.list_pages().await?;
        self.prune_sessions(&pages).await;
        Ok(pages.into_iter().map(tab_info).collect())
    }

    /// The first visible page in Chrome's most-recently-used order.
    async fn active_tab(&self) -> Result<Option<TabInfo>, BrowserError> {
        let pages = self.http.list_pages().await?;
        self.prune_sessions(&pages).await;
        for page in &pages {
            if self.is_visible(&page.id).await {
                return Ok(Some(tab_info(page.clone())));
            }
        }
        Ok(pages.into_iter().next().map(tab_info))
    }

    async fn activate(&self, id: &str) -> Result<(), BrowserError> {
        debug!("Activating tab {}", id);
        self.http.activate(id).await.map_err(|e| match e {
            CdpError::PageNotFound(id) => BrowserError::TabNotFound(id),
            other => BrowserError::ActivationFailed(other.to_string()),
        })
    }

    async fn inject_scraper(&self, tab: &str, target: &PlatformTarget) -> Result<(), BrowserError> {
        let injection = |e: CdpError| BrowserError::InjectionFailed(e.to_string());

        self.evaluate(tab, &bridge_script()).await.map_err(injection)?;

        let loaded = self
            .evaluate(tab, &is_loaded_script(&target.id))
            .await
            .map_err(injection)?;
        if loaded.as_bool() == Some(true) {
            debug!("Scraper for {} already present in tab {}", target.id, tab);
            return Ok(());
        }

        let path = self.config.scripts_dir.join(&target.script);
        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BrowserError::ScriptNotFound(path.display().to_string()));
            }
            Err(e) => {
                return Err(BrowserError::InjectionFailed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        self.evaluate(tab, &source).await.map_err(injection)?;
        self.evaluate(tab, &mark_loaded_script(&target.id))
            .await
            .map_err(injection)?;

        info!("Injected {} scraper into tab {}", target.id, tab);
        Ok(())
    }

    async fn deliver_prompt(
        &self,
        tab: &str,
        platform: &str,
        prompt: &str,
    ) -> Result<(), BrowserError> {
        let delivered = self
            .evaluate(tab, &start_query_script(prompt))
            .await
            .map_err(|e| BrowserError::DeliveryFailed(e.to_string()))?;

        if delivered.as_bool() != Some(true) {
            return Err(BrowserError::DeliveryFailed(format!(
                "no {} scraper listening in tab {}",
                platform, tab
            )));
        }

        debug!("Delivered prompt to {} in tab {}", platform, tab);
        Ok(())
    }
}
