//! End-to-end coordinator tests.
//!
//! Time is paused: the runtime jumps straight to the next pending timer
//! whenever every task is idle, so the settle, result, restore and backstop
//! delays run at their real configured values without slowing the suite.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

use fanout_core::{Coordinator, CoordinatorSettings, PlatformRegistry, QueryStatus};
use fanout_protocols::{
    BrowserError, CoordinatorEvent, PlatformTarget, QueryError, ScrapeReport, TabDriver, TabInfo,
};

// ============================================================================
// Test Helpers
// ============================================================================

const NEWS_TAB: &str = "tab-news";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Activate(String),
    Inject(String, String),
    Deliver(String, String, String),
}

/// Tab driver over an in-memory tab list that records every call.
struct MockDriver {
    tabs: Mutex<Vec<TabInfo>>,
    active: Mutex<Option<String>>,
    calls: Mutex<Vec<Call>>,
    fail_inject: Mutex<HashSet<String>>,
    fail_deliver: Mutex<HashSet<String>>,
    lookup_delay: Mutex<Duration>,
}

impl MockDriver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            tabs: Mutex::new(vec![
                TabInfo::new(NEWS_TAB, "https://news.example.com/today", "News"),
                TabInfo::new("tab-chatgpt", "https://chatgpt.com/c/1", "ChatGPT"),
                TabInfo::new("tab-gemini", "https://gemini.google.com/app", "Gemini"),
                TabInfo::new("tab-kimi", "https://kimi.moonshot.cn/chat/9", "Kimi"),
            ]),
            active: Mutex::new(Some(NEWS_TAB.to_string())),
            calls: Mutex::new(Vec::new()),
            fail_inject: Mutex::new(HashSet::new()),
            fail_deliver: Mutex::new(HashSet::new()),
            lookup_delay: Mutex::new(Duration::ZERO),
        })
    }

    fn close_tab(&self, id: &str) {
        self.tabs.lock().retain(|tab| tab.id != id);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn activations_of(&self, id: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::Activate(tab) if tab == id))
            .count()
    }
}

#[async_trait]
impl TabDriver for MockDriver {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError> {
        Ok(self.tabs.lock().clone())
    }

    async fn active_tab(&self) -> Result<Option<TabInfo>, BrowserError> {
        let active = self.active.lock().clone();
        Ok(active.and_then(|id| self.tabs.lock().iter().find(|tab| tab.id == id).cloned()))
    }

    async fn get_tab(&self, id: &str) -> Result<Option<TabInfo>, BrowserError> {
        let delay = *self.lookup_delay.lock();
        sleep(delay).await;
        Ok(self.tabs.lock().iter().find(|tab| tab.id == id).cloned())
    }

    async fn activate(&self, id: &str) -> Result<(), BrowserError> {
        self.calls.lock().push(Call::Activate(id.to_string()));
        if !self.tabs.lock().iter().any(|tab| tab.id == id) {
            return Err(BrowserError::TabNotFound(id.to_string()));
        }
        *self.active.lock() = Some(id.to_string());
        Ok(())
    }

    async fn inject_scraper(&self, tab: &str, target: &PlatformTarget) -> Result<(), BrowserError> {
        self.calls
            .lock()
            .push(Call::Inject(tab.to_string(), target.id.clone()));
        if self.fail_inject.lock().contains(tab) {
            return Err(BrowserError::InjectionFailed("Cannot access contents of the page".to_string()));
        }
        Ok(())
    }

    async fn deliver_prompt(&self, tab: &str, platform: &str, prompt: &str) -> Result<(), BrowserError> {
        self.calls.lock().push(Call::Deliver(
            tab.to_string(),
            platform.to_string(),
            prompt.to_string(),
        ));
        if self.fail_deliver.lock().contains(tab) {
            return Err(BrowserError::DeliveryFailed("Receiving end does not exist".to_string()));
        }
        Ok(())
    }
}

fn coordinator(driver: Arc<MockDriver>) -> Coordinator {
    Coordinator::new(
        Arc::new(PlatformRegistry::with_builtin()),
        driver,
        CoordinatorSettings::default(),
    )
}

fn submit(
    coordinator: &Coordinator,
    platform: &str,
    prompt: &str,
) -> JoinHandle<Result<String, QueryError>> {
    let coordinator = coordinator.clone();
    let platform = platform.to_string();
    let prompt = prompt.to_string();
    tokio::spawn(async move { coordinator.submit_query(&platform, &prompt).await })
}

/// Long enough for locate, activate, settle, inject and deliver.
async fn until_delivered() {
    sleep(Duration::from_millis(500)).await;
}

/// Long enough for the result delay and the restore delay.
async fn until_restored() {
    sleep(Duration::from_secs(5)).await;
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_scenario_a_progress_then_final() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());
    let mut events = coordinator.subscribe();

    let handle = submit(&coordinator, "chatgpt", "What is Rust?");
    until_delivered().await;

    assert_eq!(
        driver.calls(),
        vec![
            Call::Activate("tab-chatgpt".to_string()),
            Call::Inject("tab-chatgpt".to_string(), "chatgpt".to_string()),
            Call::Deliver(
                "tab-chatgpt".to_string(),
                "chatgpt".to_string(),
                "What is Rust?".to_string()
            ),
        ]
    );
    assert_eq!(
        coordinator.snapshot().query("chatgpt").unwrap().status,
        QueryStatus::AwaitingScrape
    );

    coordinator.report_progress("chatgpt", "partial");
    assert_eq!(
        coordinator.snapshot().query("chatgpt").unwrap().status,
        QueryStatus::Streaming
    );
    coordinator.report_final("chatgpt", "done");

    // The caller is resolved only after the result delay.
    sleep(Duration::from_secs(1)).await;
    assert!(!handle.is_finished());

    assert_eq!(handle.await.unwrap().unwrap(), "done");
    assert_eq!(
        events.try_recv().unwrap(),
        CoordinatorEvent::progress("chatgpt", "partial")
    );
    assert_eq!(
        events.try_recv().unwrap(),
        CoordinatorEvent::final_answer("chatgpt", "done")
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_missing_tab() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());
    let mut events = coordinator.subscribe();
    let started = Instant::now();

    let result = coordinator.submit_query("grok", "hello").await;

    let err = result.unwrap_err();
    assert!(matches!(err, QueryError::TargetNotFound { .. }));
    assert!(err.to_string().contains("not found"));
    assert!(err.to_string().contains("log in"));
    assert!(started.elapsed() < Duration::from_millis(100));

    let snapshot = coordinator.snapshot();
    assert!(snapshot.active.is_empty());
    assert!(snapshot.focus.is_none());
    assert!(driver.calls().is_empty());

    match events.try_recv().unwrap() {
        CoordinatorEvent::Error { platform, error } => {
            assert_eq!(platform, "grok");
            assert!(error.contains("https://x.com/i/grok"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_c_restore_waits_for_last_query() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let chatgpt = submit(&coordinator, "chatgpt", "compare");
    let grok = submit(&coordinator, "grok", "compare");
    until_delivered().await;

    assert!(grok.is_finished());
    assert!(matches!(
        grok.await.unwrap(),
        Err(QueryError::TargetNotFound { .. })
    ));

    // Grok leaving the active set is not enough to restore focus.
    until_restored().await;
    assert_eq!(coordinator.snapshot().active, vec!["chatgpt"]);
    assert_eq!(driver.activations_of(NEWS_TAB), 0);
    assert_eq!(
        coordinator.snapshot().focus.unwrap().tab_id,
        NEWS_TAB.to_string()
    );

    coordinator.report_final("chatgpt", "answer");
    assert_eq!(chatgpt.await.unwrap().unwrap(), "answer");
    until_restored().await;

    assert_eq!(driver.activations_of(NEWS_TAB), 1);
    assert!(coordinator.snapshot().is_idle());
}

// ============================================================================
// Testable Properties
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_each_query_resolves_with_its_own_result() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let chatgpt = submit(&coordinator, "chatgpt", "q");
    let gemini = submit(&coordinator, "gemini", "q");
    let kimi = submit(&coordinator, "kimi", "q");
    until_delivered().await;
    assert_eq!(
        coordinator.snapshot().active,
        vec!["chatgpt", "gemini", "kimi"]
    );

    coordinator.report_error("gemini", "No response received");
    coordinator.report_progress("chatgpt", "c-partial");
    coordinator.report_final("kimi", "k-final");
    coordinator.report_progress("chatgpt", "c-more");
    coordinator.report_final("chatgpt", "c-final");

    assert_eq!(chatgpt.await.unwrap().unwrap(), "c-final");
    assert_eq!(kimi.await.unwrap().unwrap(), "k-final");
    match gemini.await.unwrap() {
        Err(QueryError::Scrape { platform, message }) => {
            assert_eq!(platform, "gemini");
            assert_eq!(message, "No response received");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_terminal_report_without_pending_query_is_broadcast_only() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());
    let mut events = coordinator.subscribe();

    let handle = submit(&coordinator, "chatgpt", "q");
    until_delivered().await;
    let before = coordinator.snapshot();

    coordinator.report_final("gemini", "stale");
    coordinator.report_error("kimi", "too late");

    let after = coordinator.snapshot();
    let pending = |s: &fanout_core::CoordinatorSnapshot| {
        s.queries
            .iter()
            .map(|q| (q.platform.clone(), q.id, q.status))
            .collect::<Vec<_>>()
    };
    assert_eq!(before.active, after.active);
    assert_eq!(pending(&before), pending(&after));
    assert_eq!(
        events.try_recv().unwrap(),
        CoordinatorEvent::final_answer("gemini", "stale")
    );
    assert_eq!(
        events.try_recv().unwrap(),
        CoordinatorEvent::error("kimi", "too late")
    );

    coordinator.report_final("chatgpt", "ok");
    assert_eq!(handle.await.unwrap().unwrap(), "ok");
}

#[tokio::test(start_paused = true)]
async fn test_late_progress_is_discarded() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());
    let mut events = coordinator.subscribe();

    let handle = submit(&coordinator, "chatgpt", "q");
    until_delivered().await;
    coordinator.report_final("chatgpt", "done");
    coordinator.report_progress("chatgpt", "late");

    assert_eq!(handle.await.unwrap().unwrap(), "done");
    assert_eq!(
        events.try_recv().unwrap(),
        CoordinatorEvent::final_answer("chatgpt", "done")
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_final_is_not_delivered_twice() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let handle = submit(&coordinator, "gemini", "q");
    until_delivered().await;
    coordinator.report_final("gemini", "first");
    coordinator.report_final("gemini", "second");

    assert_eq!(handle.await.unwrap().unwrap(), "first");
    assert!(coordinator.snapshot().active.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_platform_mutates_nothing() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let result = coordinator.submit_query("myspace", "hello").await;

    assert!(matches!(result, Err(QueryError::UnknownPlatform(ref p)) if p == "myspace"));
    assert!(coordinator.snapshot().is_idle());
    assert!(driver.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_tab_does_not_affect_sibling() {
    let driver = MockDriver::new();
    driver.close_tab("tab-gemini");
    let coordinator = coordinator(driver.clone());

    let chatgpt = submit(&coordinator, "chatgpt", "q");
    let gemini = submit(&coordinator, "gemini", "q");
    until_delivered().await;

    assert!(matches!(
        gemini.await.unwrap(),
        Err(QueryError::TargetNotFound { .. })
    ));
    assert_eq!(coordinator.snapshot().active, vec!["chatgpt"]);

    coordinator.report_final("chatgpt", "fine");
    assert_eq!(chatgpt.await.unwrap().unwrap(), "fine");
}

#[tokio::test(start_paused = true)]
async fn test_restore_scheduled_once_per_burst() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let chatgpt = submit(&coordinator, "chatgpt", "q");
    let gemini = submit(&coordinator, "gemini", "q");
    until_delivered().await;

    coordinator.report_final("chatgpt", "a");
    chatgpt.await.unwrap().unwrap();
    until_restored().await;
    assert_eq!(driver.activations_of(NEWS_TAB), 0);
    assert!(!coordinator.snapshot().restore_scheduled);

    coordinator.report_final("gemini", "b");
    gemini.await.unwrap().unwrap();
    assert!(coordinator.snapshot().restore_scheduled);
    coordinator.check_and_restore_focus();
    coordinator.check_and_restore_focus();

    until_restored().await;
    until_restored().await;
    assert_eq!(driver.activations_of(NEWS_TAB), 1);
    assert!(coordinator.snapshot().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_restore_with_closed_original_tab() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let handle = submit(&coordinator, "chatgpt", "q");
    until_delivered().await;
    driver.close_tab(NEWS_TAB);

    coordinator.report_final("chatgpt", "done");
    handle.await.unwrap().unwrap();
    until_restored().await;

    assert_eq!(driver.activations_of(NEWS_TAB), 0);
    assert!(coordinator.snapshot().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_new_burst_during_scheduled_restore_inherits_focus() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let first = submit(&coordinator, "chatgpt", "q1");
    until_delivered().await;
    coordinator.report_final("chatgpt", "a");
    first.await.unwrap().unwrap();
    assert!(coordinator.snapshot().restore_scheduled);

    // ChatGPT is frontmost now; the new query must not capture it.
    let second = submit(&coordinator, "kimi", "q2");
    until_restored().await;
    assert_eq!(driver.activations_of(NEWS_TAB), 0);
    assert_eq!(
        coordinator.snapshot().focus.unwrap().tab_id,
        NEWS_TAB.to_string()
    );

    coordinator.report_final("kimi", "b");
    second.await.unwrap().unwrap();
    until_restored().await;
    assert_eq!(driver.activations_of(NEWS_TAB), 1);
    assert!(coordinator.snapshot().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_query_started_during_restore_lookup_cancels_restore() {
    let driver = MockDriver::new();
    *driver.lookup_delay.lock() = Duration::from_millis(500);
    let coordinator = coordinator(driver.clone());

    let first = submit(&coordinator, "chatgpt", "q1");
    until_delivered().await;
    coordinator.report_final("chatgpt", "a");
    first.await.unwrap().unwrap();

    // The restore timer has fired and is looking up the original tab.
    sleep(Duration::from_millis(2100)).await;
    assert!(coordinator.snapshot().restore_scheduled);
    let second = submit(&coordinator, "gemini", "q2");
    sleep(Duration::from_secs(1)).await;

    assert_eq!(coordinator.snapshot().active, vec!["gemini".to_string()]);
    assert_eq!(driver.activations_of(NEWS_TAB), 0);
    assert_eq!(
        driver.calls().last(),
        Some(&Call::Deliver(
            "tab-gemini".to_string(),
            "gemini".to_string(),
            "q2".to_string()
        ))
    );
    assert!(!coordinator.snapshot().restore_scheduled);
    assert_eq!(
        coordinator.snapshot().focus.unwrap().tab_id,
        NEWS_TAB.to_string()
    );

    coordinator.report_final("gemini", "b");
    second.await.unwrap().unwrap();
    until_restored().await;
    assert_eq!(driver.activations_of(NEWS_TAB), 1);
    assert!(coordinator.snapshot().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_backstop_timeout_unblocks_restoration() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());
    let mut events = coordinator.subscribe();
    let started = Instant::now();

    let result = coordinator.submit_query("chatgpt", "silent").await;

    assert!(matches!(
        result,
        Err(QueryError::Timeout { ref platform, seconds: 45 }) if platform == "chatgpt"
    ));
    assert!(started.elapsed() >= Duration::from_secs(45));
    assert!(coordinator.snapshot().active.is_empty());
    assert!(matches!(
        events.try_recv().unwrap(),
        CoordinatorEvent::Error { .. }
    ));

    until_restored().await;
    assert_eq!(driver.activations_of(NEWS_TAB), 1);
    assert!(coordinator.snapshot().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_backstop_ignores_superseding_query() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());

    let first = submit(&coordinator, "chatgpt", "q1");
    sleep(Duration::from_secs(30)).await;
    let second = submit(&coordinator, "chatgpt", "q2");

    assert!(matches!(
        first.await.unwrap(),
        Err(QueryError::Superseded(_))
    ));

    // The first query's backstop fires at 45s and must leave the second alone.
    sleep(Duration::from_secs(20)).await;
    assert_eq!(coordinator.snapshot().active, vec!["chatgpt"]);

    coordinator.report_final("chatgpt", "second");
    assert_eq!(second.await.unwrap().unwrap(), "second");
}

#[tokio::test(start_paused = true)]
async fn test_injection_failure_is_scoped() {
    let driver = MockDriver::new();
    driver.fail_inject.lock().insert("tab-gemini".to_string());
    let coordinator = coordinator(driver.clone());

    let chatgpt = submit(&coordinator, "chatgpt", "q");
    let gemini = submit(&coordinator, "gemini", "q");
    until_delivered().await;

    assert_eq!(coordinator.snapshot().active, vec!["chatgpt"]);
    let delivered_to_gemini = driver
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Deliver(tab, _, _) if tab == "tab-gemini"));
    assert!(!delivered_to_gemini);

    coordinator.report_final("chatgpt", "ok");
    assert!(matches!(
        gemini.await.unwrap(),
        Err(QueryError::Injection { ref platform, .. }) if platform == "gemini"
    ));
    assert_eq!(chatgpt.await.unwrap().unwrap(), "ok");
}

#[tokio::test(start_paused = true)]
async fn test_delivery_failure() {
    let driver = MockDriver::new();
    driver.fail_deliver.lock().insert("tab-kimi".to_string());
    let coordinator = coordinator(driver.clone());
    let mut events = coordinator.subscribe();

    let result = coordinator.submit_query("kimi", "q").await;

    let err = result.unwrap_err();
    assert!(matches!(err, QueryError::Delivery { .. }));
    assert!(err.to_string().contains("Receiving end does not exist"));
    assert_eq!(
        events.try_recv().unwrap(),
        CoordinatorEvent::error("kimi", err.to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_coordinator_usable_after_failures() {
    let driver = MockDriver::new();
    driver.fail_deliver.lock().insert("tab-chatgpt".to_string());
    let coordinator = coordinator(driver.clone());

    assert!(coordinator.submit_query("chatgpt", "q").await.is_err());

    driver.fail_deliver.lock().clear();
    let handle = submit(&coordinator, "chatgpt", "again");
    until_delivered().await;
    coordinator.handle_report(ScrapeReport::Final {
        platform: "chatgpt".to_string(),
        text: "recovered".to_string(),
    });
    assert_eq!(handle.await.unwrap().unwrap(), "recovered");
}

#[tokio::test(start_paused = true)]
async fn test_fan_out_to_enabled_platforms() {
    let driver = MockDriver::new();
    let coordinator = coordinator(driver.clone());
    let enabled = coordinator.registry().enabled();

    let fan_out = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.fan_out("hi", &enabled).await })
    };
    until_delivered().await;
    coordinator.report_final("gemini", "g");
    coordinator.report_final("chatgpt", "c");

    let results = fan_out.await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "chatgpt");
    assert_eq!(results[0].1.as_ref().unwrap(), "c");
    assert_eq!(results[1].0, "gemini");
    assert_eq!(results[1].1.as_ref().unwrap(), "g");
}
