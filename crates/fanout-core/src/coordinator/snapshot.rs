//! Point-in-time view of the coordinator, for status endpoints and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{CoordinatorState, QueryStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    /// Platforms with an outstanding query, sorted.
    pub active: Vec<String>,
    /// Pending queries, sorted by platform.
    pub queries: Vec<QuerySnapshot>,
    pub focus: Option<FocusSnapshot>,
    pub restore_scheduled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySnapshot {
    pub id: u64,
    pub platform: String,
    pub status: QueryStatus,
    pub created_at: DateTime<Utc>,
    pub age_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSnapshot {
    pub tab_id: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
}

impl CoordinatorSnapshot {
    pub(crate) fn capture(state: &CoordinatorState) -> Self {
        let now = Utc::now();

        let mut active: Vec<_> = state.active.iter().cloned().collect();
        active.sort();

        let mut queries: Vec<_> = state
            .pending
            .iter()
            .map(|(platform, query)| QuerySnapshot {
                id: query.id,
                platform: platform.clone(),
                status: query.status,
                created_at: query.created_at,
                age_ms: (now - query.created_at).num_milliseconds(),
            })
            .collect();
        queries.sort_by(|a, b| a.platform.cmp(&b.platform));

        Self {
            active,
            queries,
            focus: state.focus.as_ref().map(|focus| FocusSnapshot {
                tab_id: focus.tab_id.clone(),
                url: focus.url.clone(),
                captured_at: focus.captured_at,
            }),
            restore_scheduled: state.restore_scheduled,
        }
    }

    /// Whether nothing is in flight and nothing is waiting to be restored.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.focus.is_none() && !self.restore_scheduled
    }

    pub fn query(&self, platform: &str) -> Option<&QuerySnapshot> {
        self.queries.iter().find(|query| query.platform == platform)
    }
}
