//! Mutable coordinator state.
//!
//! Everything here lives behind the coordinator's mutex. Methods are
//! synchronous so the lock is never held across an `.await`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use fanout_protocols::{PlatformId, QueryError, TabId};

pub(crate) type QueryResult = Result<String, QueryError>;

/// Lifecycle position of a pending query.
///
/// Terminal outcomes are not represented: a query leaves the state as soon
/// as it completes or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Registered, tab not located yet.
    Pending,
    /// Tab found, being brought to the foreground.
    Activating,
    /// Waiting for the settle delay and script injection.
    Injecting,
    /// Prompt delivered, no report received yet.
    AwaitingScrape,
    /// At least one progress report received.
    Streaming,
}

/// One in-flight request to one platform.
pub(crate) struct PendingQuery {
    pub id: u64,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub status: QueryStatus,
    responder: oneshot::Sender<QueryResult>,
}

impl PendingQuery {
    pub fn new(id: u64, prompt: impl Into<String>, responder: oneshot::Sender<QueryResult>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            created_at: Utc::now(),
            status: QueryStatus::Pending,
            responder,
        }
    }

    /// Resolve the waiting caller. A caller that went away is ignored.
    pub fn resolve(self, result: QueryResult) {
        let _ = self.responder.send(result);
    }
}

/// The tab that was frontmost when the current burst started.
#[derive(Debug, Clone)]
pub(crate) struct FocusState {
    pub tab_id: TabId,
    pub url: String,
    pub captured_at: DateTime<Utc>,
    /// Query that captured it.
    pub owner: u64,
}

#[derive(Default)]
pub(crate) struct CoordinatorState {
    pub pending: HashMap<PlatformId, PendingQuery>,
    pub active: HashSet<PlatformId>,
    pub focus: Option<FocusState>,
    pub restore_scheduled: bool,
}

impl CoordinatorState {
    /// Register a query, returning the query it superseded, if any.
    pub fn register(&mut self, platform: &str, query: PendingQuery) -> Option<PendingQuery> {
        self.active.insert(platform.to_string());
        self.pending.insert(platform.to_string(), query)
    }

    /// Remove the pending query for `platform`. With `id` set, only a query
    /// with that id is removed.
    pub fn take(&mut self, platform: &str, id: Option<u64>) -> Option<PendingQuery> {
        match (self.pending.get(platform), id) {
            (None, _) => return None,
            (Some(query), Some(id)) if query.id != id => return None,
            _ => {}
        }
        self.active.remove(platform);
        self.pending.remove(platform)
    }

    /// Move a query forward. Returns false when the query is no longer the
    /// pending one for its platform.
    pub fn set_status(&mut self, platform: &str, id: u64, status: QueryStatus) -> bool {
        match self.pending.get_mut(platform) {
            Some(query) if query.id == id => {
                query.status = status;
                true
            }
            _ => false,
        }
    }

    /// Mark the pending query for `platform` as streaming.
    pub fn mark_streaming(&mut self, platform: &str) -> bool {
        match self.pending.get_mut(platform) {
            Some(query) => {
                query.status = QueryStatus::Streaming;
                true
            }
            None => false,
        }
    }

    /// Install the focus state unless one already exists.
    pub fn install_focus(&mut self, focus: FocusState) -> bool {
        if self.focus.is_some() {
            return false;
        }
        self.focus = Some(focus);
        true
    }

    /// Drop the focus state installed by `owner` if nothing else relies on
    /// it any more.
    pub fn release_focus(&mut self, owner: u64) -> bool {
        let owned = matches!(&self.focus, Some(focus) if focus.owner == owner);
        if owned && self.active.is_empty() && !self.restore_scheduled {
            self.focus = None;
            return true;
        }
        false
    }

    /// Claim the restoration timer. Succeeds only when the active set is
    /// empty, no restoration is scheduled and there is a tab to go back to.
    pub fn begin_restore(&mut self) -> bool {
        if !self.active.is_empty() || self.restore_scheduled || self.focus.is_none() {
            return false;
        }
        self.restore_scheduled = true;
        true
    }
}
