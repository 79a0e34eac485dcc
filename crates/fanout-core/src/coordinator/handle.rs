//! Coordinator handle and its public operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

use fanout_protocols::{
    ConnectionStatus, CoordinatorEvent, PlatformId, QueryError, ScrapeReport, TabDriver, TabInfo,
};

use super::settings::CoordinatorSettings;
use super::snapshot::CoordinatorSnapshot;
use super::state::{CoordinatorState, PendingQuery, QueryResult};
use crate::registry::PlatformRegistry;

/// The request coordinator.
///
/// Cheap to clone; all clones share one state. Spawned timers keep the
/// shared state alive until they fire.
#[derive(Clone)]
pub struct Coordinator {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    pub registry: Arc<PlatformRegistry>,
    pub driver: Arc<dyn TabDriver>,
    pub settings: CoordinatorSettings,
    pub state: Mutex<CoordinatorState>,
    events: broadcast::Sender<CoordinatorEvent>,
    next_id: AtomicU64,
}

impl Coordinator {
    pub fn new(
        registry: Arc<PlatformRegistry>,
        driver: Arc<dyn TabDriver>,
        settings: CoordinatorSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(settings.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                registry,
                driver,
                settings,
                state: Mutex::new(CoordinatorState::default()),
                events,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<PlatformRegistry> {
        &self.inner.registry
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.inner.settings
    }

    /// Subscribe to progress/final/error broadcast events.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot::capture(&self.inner.state.lock())
    }

    /// Send `prompt` to `platform` and wait for its terminal event.
    ///
    /// Fails immediately for an unknown platform without touching any
    /// state. Otherwise resolves exactly once: with the final answer text,
    /// or with the error that ended the query.
    pub async fn submit_query(&self, platform: &str, prompt: &str) -> Result<String, QueryError> {
        let target = self
            .inner
            .registry
            .get(platform)
            .ok_or_else(|| QueryError::UnknownPlatform(platform.to_string()))?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!(platform = %target.id, query_id = id, "Submitting query");

        self.inner.capture_focus(id).await;
        let receiver = self.inner.register(&target.id, id, prompt);
        self.inner.spawn_backstop(target.id.clone(), id);
        tokio::spawn(self.inner.clone().run_query(target, id, prompt.to_string()));

        receiver
            .await
            .unwrap_or_else(|_| Err(QueryError::Cancelled(platform.to_string())))
    }

    /// Submit `prompt` to several platforms concurrently. Results keep the
    /// order of `platforms`.
    pub async fn fan_out(
        &self,
        prompt: &str,
        platforms: &[PlatformId],
    ) -> Vec<(PlatformId, Result<String, QueryError>)> {
        let queries = platforms.iter().map(|platform| async move {
            (platform.clone(), self.submit_query(platform, prompt).await)
        });
        join_all(queries).await
    }

    /// Partial answer text from a scraper.
    pub fn report_progress(&self, platform: &str, text: impl Into<String>) {
        if !self.inner.state.lock().mark_streaming(platform) {
            debug!("Discarding progress for {} with no pending query", platform);
            return;
        }
        self.inner.broadcast(CoordinatorEvent::progress(platform, text));
    }

    /// Final answer text from a scraper.
    pub fn report_final(&self, platform: &str, text: impl Into<String>) {
        let text = text.into();
        if !self.inner.finish(platform, None, Ok(text.clone())) {
            debug!("Final report for {} with no pending query", platform);
            self.inner.broadcast(CoordinatorEvent::final_answer(platform, text));
        }
    }

    /// Error reported by a scraper, including its own observation timeout.
    pub fn report_error(&self, platform: &str, message: impl Into<String>) {
        let message = message.into();
        let error = QueryError::Scrape {
            platform: platform.to_string(),
            message: message.clone(),
        };
        if !self.inner.finish(platform, None, Err(error)) {
            debug!("Error report for {} with no pending query", platform);
            self.inner.broadcast(CoordinatorEvent::error(platform, message));
        }
    }

    /// Dispatch a parsed scraper report.
    pub fn handle_report(&self, report: ScrapeReport) {
        match report {
            ScrapeReport::Progress { platform, text } => self.report_progress(&platform, text),
            ScrapeReport::Final { platform, text } => self.report_final(&platform, text),
            ScrapeReport::Error { platform, error } => self.report_error(&platform, error),
        }
    }

    /// Schedule a switch back to the tab that was frontmost when the burst
    /// started, if the active set is empty and nothing is scheduled yet.
    pub fn check_and_restore_focus(&self) {
        self.inner.check_and_restore_focus();
    }

    /// Whether a tab matching the platform's pattern is open.
    pub async fn check_connection(&self, platform: &str) -> ConnectionStatus {
        let Some(target) = self.inner.registry.get(platform) else {
            return ConnectionStatus::unknown_platform(platform);
        };

        match self.inner.locate_tab(&target).await {
            Ok(Some(_)) => ConnectionStatus::connected(platform),
            Ok(None) => ConnectionStatus::tab_not_found(platform),
            Err(e) => {
                warn!("Connection check for {} failed: {}", platform, e);
                ConnectionStatus::unavailable(platform, e.to_string())
            }
        }
    }

    /// Every open tab, for debugging.
    pub async fn list_tabs(&self) -> Result<Vec<TabInfo>, QueryError> {
        Ok(self.inner.driver.list_tabs().await?)
    }
}

impl Inner {
    pub(super) fn broadcast(&self, event: CoordinatorEvent) {
        debug!(platform = event.platform(), terminal = event.is_terminal(), "Broadcasting event");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Register a query as pending, failing any query it supersedes.
    fn register(&self, platform: &str, id: u64, prompt: &str) -> oneshot::Receiver<QueryResult> {
        let (responder, receiver) = oneshot::channel();
        let superseded = self
            .state
            .lock()
            .register(platform, PendingQuery::new(id, prompt, responder));

        if let Some(old) = superseded {
            warn!(platform, query_id = old.id, "Query superseded by query {}", id);
            old.resolve(Err(QueryError::Superseded(platform.to_string())));
        }
        receiver
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
