//! Coordinator timings.

use std::time::Duration;

use fanout_config::CoordinatorConfig;

/// Timer and channel settings for a [`Coordinator`](super::Coordinator).
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Wait between foregrounding a tab and injecting its scraper.
    pub settle_delay: Duration,
    /// Wait between a terminal event and resolving the waiting caller.
    pub result_delay: Duration,
    /// Wait between the active set draining and restoring the original tab.
    pub restore_delay: Duration,
    /// Backstop for queries that never report a terminal event.
    pub query_timeout: Duration,
    /// Capacity of the broadcast event channel.
    pub event_capacity: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from(&CoordinatorConfig::default())
    }
}

impl From<&CoordinatorConfig> for CoordinatorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
            result_delay: config.result_delay(),
            restore_delay: config.restore_delay(),
            query_timeout: config.query_timeout(),
            event_capacity: config.event_capacity.max(1),
        }
    }
}
