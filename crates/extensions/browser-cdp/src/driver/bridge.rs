//! Page-side glue between scraper scripts and the driver.
//!
//! Scrapers are written against the browser-extension messaging API: they
//! register a `chrome.runtime.onMessage` listener for `startQuery` and reply
//! with `chrome.runtime.sendMessage`. The bridge installs a stand-in for
//! both that routes outgoing messages through the CDP binding and exposes
//! a start function the driver calls to dispatch the prompt.

use serde_json::Value;

/// Name of the page binding scrapers report through.
pub const REPORT_BINDING: &str = "__fanoutReport";

/// Name of the page function that hands a prompt to the scraper.
pub const START_QUERY_FN: &str = "__fanoutStartQuery";

/// Per-page registry of scrapers already evaluated, keyed by platform.
const LOADED_SCRAPERS: &str = "__fanoutScrapers";

const BRIDGE_TEMPLATE: &str = r#"(() => {
  if (typeof window.%START% === 'function') {
    return false;
  }
  const listeners = [];
  const send = (message) => {
    try {
      window.%REPORT%(JSON.stringify(message));
    } catch (err) {
      console.error('[fanout] report failed', err);
    }
  };
  const runtime = {
    id: 'fanout',
    lastError: undefined,
    onMessage: {
      addListener: (fn) => { listeners.push(fn); },
      removeListener: (fn) => {
        const i = listeners.indexOf(fn);
        if (i >= 0) listeners.splice(i, 1);
      },
      hasListeners: () => listeners.length > 0,
    },
    sendMessage: (message, callback) => {
      send(message);
      if (typeof callback === 'function') callback();
      return Promise.resolve();
    },
  };
  window.chrome = window.chrome || {};
  Object.defineProperty(window.chrome, 'runtime', {
    value: runtime,
    configurable: true,
    writable: true,
  });
  window.%LOADED% = window.%LOADED% || {};
  window.%START% = (prompt) => {
    const message = { type: 'startQuery', prompt };
    for (const fn of listeners.slice()) {
      try {
        fn(message, { id: 'fanout' }, () => {});
      } catch (err) {
        console.error('[fanout] scraper listener threw', err);
      }
    }
    return listeners.length > 0;
  };
  return true;
})()"#;

/// Script installing the messaging bridge. Evaluates to `true` when it was
/// installed, `false` when the page already had it.
pub(crate) fn bridge_script() -> String {
    BRIDGE_TEMPLATE
        .replace("%START%", START_QUERY_FN)
        .replace("%REPORT%", REPORT_BINDING)
        .replace("%LOADED%", LOADED_SCRAPERS)
}

/// Expression checking whether the platform's scraper already runs in the page.
pub(crate) fn is_loaded_script(platform: &str) -> String {
    format!(
        "Boolean(window.{LOADED_SCRAPERS} && window.{LOADED_SCRAPERS}[{}])",
        js_string(platform)
    )
}

/// Statement recording that the platform's scraper was evaluated.
pub(crate) fn mark_loaded_script(platform: &str) -> String {
    format!(
        "(window.{LOADED_SCRAPERS} = window.{LOADED_SCRAPERS} || {{}})[{}] = true",
        js_string(platform)
    )
}

/// Expression dispatching `startQuery(prompt)`. Evaluates to `true` only if
/// at least one scraper listener received it.
pub(crate) fn start_query_script(prompt: &str) -> String {
    format!(
        "typeof window.{START_QUERY_FN} === 'function' && window.{START_QUERY_FN}({})",
        js_string(prompt)
    )
}

/// Quote a string as a JavaScript literal.
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}
