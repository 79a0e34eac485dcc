//! Application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use fanout_core::Coordinator;

/// Application state shared across handlers.
pub struct AppState {
    pub coordinator: Coordinator,
    start_time: Instant,
    request_count: AtomicU64,
}

impl AppState {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn shared(coordinator: Coordinator) -> Arc<Self> {
        Arc::new(Self::new(coordinator))
    }

    /// Get uptime.
    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Number of queries submitted through this interface.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_requests(&self, by: u64) {
        self.request_count.fetch_add(by, Ordering::Relaxed);
    }
}
