//! Session focus capture and restoration.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::handle::Inner;
use super::state::FocusState;

impl Inner {
    /// Remember the frontmost tab if the current burst has none yet.
    pub(super) async fn capture_focus(&self, id: u64) {
        if self.state.lock().focus.is_some() {
            return;
        }

        match self.driver.active_tab().await {
            Ok(Some(tab)) => {
                let installed = self.state.lock().install_focus(FocusState {
                    tab_id: tab.id.clone(),
                    url: tab.url.clone(),
                    captured_at: Utc::now(),
                    owner: id,
                });
                if installed {
                    debug!(query_id = id, "Captured focus: tab {} ({})", tab.id, tab.url);
                }
            }
            Ok(None) => debug!(query_id = id, "No foreground tab to capture"),
            Err(e) => warn!(query_id = id, "Failed to read foreground tab: {}", e),
        }
    }

    pub(super) fn check_and_restore_focus(self: &Arc<Self>) {
        if !self.state.lock().begin_restore() {
            return;
        }

        debug!("Active set drained, restoring focus in {:?}", self.settings.restore_delay);
        let inner = self.clone();
        tokio::spawn(async move {
            sleep(inner.settings.restore_delay).await;
            inner.restore_focus().await;
        });
    }

    /// Cancel a scheduled restoration if queries are active again. The new
    /// burst inherits the focus state.
    fn abandon_restore_if_busy(&self) -> bool {
        let mut state = self.state.lock();
        if state.active.is_empty() {
            return false;
        }
        state.restore_scheduled = false;
        debug!("Queries pending again, skipping focus restoration");
        true
    }

    async fn restore_focus(&self) {
        if self.abandon_restore_if_busy() {
            return;
        }
        let focus = self.state.lock().focus.clone();

        if let Some(focus) = focus {
            match self.driver.get_tab(&focus.tab_id).await {
                Ok(Some(_)) => {
                    // The lookup awaited; a query may have started meanwhile.
                    if self.abandon_restore_if_busy() {
                        return;
                    }
                    match self.driver.activate(&focus.tab_id).await {
                        Ok(()) => info!("Restored focus to tab {} ({})", focus.tab_id, focus.url),
                        Err(e) => warn!("Failed to restore focus to tab {}: {}", focus.tab_id, e),
                    }
                }
                Ok(None) => info!("Original tab {} was closed, nothing to restore", focus.tab_id),
                Err(e) => warn!("Failed to look up tab {}: {}", focus.tab_id, e),
            }
        }

        let mut state = self.state.lock();
        if state.active.is_empty() {
            state.focus = None;
        }
        state.restore_scheduled = false;
    }
}
