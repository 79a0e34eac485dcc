//! Per-query lifecycle: locate, activate, settle, inject, deliver, and the
//! terminal transitions that end a query.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use fanout_protocols::{BrowserError, CoordinatorEvent, PlatformTarget, QueryError, TabInfo};

use super::handle::Inner;
use super::state::{QueryResult, QueryStatus};

impl Inner {
    /// First open tab matching the platform's pattern.
    pub(super) async fn locate_tab(
        &self,
        target: &PlatformTarget,
    ) -> Result<Option<TabInfo>, BrowserError> {
        Ok(self
            .driver
            .list_tabs()
            .await?
            .into_iter()
            .find(|tab| target.matches(&tab.url)))
    }

    pub(super) async fn run_query(
        self: Arc<Self>,
        target: Arc<PlatformTarget>,
        id: u64,
        prompt: String,
    ) {
        let platform = target.id.as_str();

        let tab = match self.locate_tab(&target).await {
            Ok(Some(tab)) => tab,
            Ok(None) => {
                let error = QueryError::TargetNotFound {
                    platform: platform.to_string(),
                    site: target.site().to_string(),
                };
                self.fail_fast(platform, id, error);
                return;
            }
            Err(e) => {
                self.fail_fast(platform, id, QueryError::Browser(e));
                return;
            }
        };

        debug!(platform, query_id = id, tab = %tab.id, "Located target tab");
        if let Err(error) = self.deliver(&target, &tab, id, &prompt).await {
            warn!(platform, query_id = id, "Query failed: {}", error);
            self.finish(platform, Some(id), Err(error));
        }
    }

    /// activate -> settle -> inject -> deliver. Stops quietly once the
    /// query is no longer the pending one for its platform.
    async fn deliver(
        &self,
        target: &PlatformTarget,
        tab: &TabInfo,
        id: u64,
        prompt: &str,
    ) -> Result<(), QueryError> {
        let platform = target.id.as_str();

        if !self.advance(platform, id, QueryStatus::Activating) {
            return Ok(());
        }
        self.driver
            .activate(&tab.id)
            .await
            .map_err(|e| QueryError::Activation {
                platform: platform.to_string(),
                message: e.to_string(),
            })?;

        if !self.advance(platform, id, QueryStatus::Injecting) {
            return Ok(());
        }
        sleep(self.settings.settle_delay).await;
        self.driver
            .inject_scraper(&tab.id, target)
            .await
            .map_err(|e| QueryError::Injection {
                platform: platform.to_string(),
                message: e.to_string(),
            })?;

        if !self.advance(platform, id, QueryStatus::AwaitingScrape) {
            return Ok(());
        }
        self.driver
            .deliver_prompt(&tab.id, platform, prompt)
            .await
            .map_err(|e| QueryError::Delivery {
                platform: platform.to_string(),
                message: e.to_string(),
            })?;

        info!(platform, query_id = id, "Prompt delivered");
        Ok(())
    }

    fn advance(&self, platform: &str, id: u64, status: QueryStatus) -> bool {
        let advanced = self.state.lock().set_status(platform, id, status);
        if !advanced {
            debug!(platform, query_id = id, "Query no longer pending, stopping at {:?}", status);
        }
        advanced
    }

    /// Fail a query before its tab was touched: no result delay, and the
    /// focus state it captured is dropped unless other queries rely on it.
    fn fail_fast(self: &Arc<Self>, platform: &str, id: u64, error: QueryError) {
        let query = {
            let mut state = self.state.lock();
            let query = state.take(platform, Some(id));
            if query.is_some() && state.release_focus(id) {
                debug!(platform, query_id = id, "Released focus state captured by failed query");
            }
            query
        };
        let Some(query) = query else {
            return;
        };

        warn!(platform, query_id = id, "Query failed: {}", error);
        self.broadcast(CoordinatorEvent::error(platform, error.to_string()));
        query.resolve(Err(error));
        self.check_and_restore_focus();
    }

    /// Terminal transition for the pending query of `platform` (only the
    /// query with `id` when set). Removes it from the active set, broadcasts
    /// the terminal event, and resolves the caller after the result delay.
    ///
    /// Returns false when there was no matching pending query.
    pub(super) fn finish(
        self: &Arc<Self>,
        platform: &str,
        id: Option<u64>,
        result: QueryResult,
    ) -> bool {
        let Some(query) = self.state.lock().take(platform, id) else {
            return false;
        };

        let event = match &result {
            Ok(text) => CoordinatorEvent::final_answer(platform, text.clone()),
            Err(error) => CoordinatorEvent::error(platform, error.to_string()),
        };
        info!(
            platform,
            query_id = query.id,
            success = result.is_ok(),
            "Query finished"
        );
        self.broadcast(event);

        let inner = self.clone();
        tokio::spawn(async move {
            sleep(inner.settings.result_delay).await;
            query.resolve(result);
            inner.check_and_restore_focus();
        });
        true
    }

    /// Fail the query with `id` if it is still pending when the backstop
    /// timeout elapses.
    pub(super) fn spawn_backstop(self: &Arc<Self>, platform: String, id: u64) {
        let inner = self.clone();
        tokio::spawn(async move {
            let timeout = inner.settings.query_timeout;
            sleep(timeout).await;
            let error = QueryError::Timeout {
                platform: platform.clone(),
                seconds: timeout.as_secs(),
            };
            if inner.finish(&platform, Some(id), Err(error)) {
                warn!(platform = %platform, query_id = id, "Query timed out");
            }
        });
    }
}
