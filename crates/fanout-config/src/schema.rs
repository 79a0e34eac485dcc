//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub platforms: PlatformsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP/WebSocket interface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

/// Browser (Chrome DevTools Protocol) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Full debugging endpoint; overrides `debug_port` when set.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Directory scraper scripts are resolved against.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            endpoint: None,
            scripts_dir: default_scripts_dir(),
        }
    }
}

impl BrowserConfig {
    /// The CDP HTTP endpoint.
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.debug_port))
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

/// Coordinator timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Wait between foregrounding a tab and injecting the scraper.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Wait between a terminal event and resolving the caller, so the
    /// result is visible before any tab switch.
    #[serde(default = "default_result_delay_ms")]
    pub result_delay_ms: u64,

    /// Wait before switching back to the tab that was frontmost when the
    /// burst started.
    #[serde(default = "default_restore_delay_ms")]
    pub restore_delay_ms: u64,

    /// Backstop timeout for a query that never reports a terminal event.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Broadcast channel capacity.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            result_delay_ms: default_result_delay_ms(),
            restore_delay_ms: default_restore_delay_ms(),
            query_timeout_secs: default_query_timeout_secs(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl CoordinatorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }

    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.restore_delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_result_delay_ms() -> u64 {
    2000
}

fn default_restore_delay_ms() -> u64 {
    2000
}

fn default_query_timeout_secs() -> u64 {
    45
}

fn default_event_capacity() -> usize {
    256
}

/// Platform selection and custom platform definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    /// Platforms a fan-out targets when the caller does not name any.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,

    /// Additional platforms, or overrides of built-in ones with the same id.
    #[serde(default)]
    pub custom: Vec<CustomPlatformConfig>,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            custom: Vec::new(),
        }
    }
}

fn default_enabled() -> Vec<String> {
    vec!["chatgpt".to_string(), "gemini".to_string()]
}

/// A user-defined platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPlatformConfig {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    pub url_pattern: String,

    /// Scraper script, relative to `browser.scripts_dir`; defaults to
    /// `content_<id>.js`.
    #[serde(default)]
    pub script: Option<String>,
}

impl CustomPlatformConfig {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.clone())
    }

    pub fn script_path(&self) -> String {
        self.script
            .clone()
            .unwrap_or_else(|| format!("content_{}.js", self.id))
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rolling log files; `~/.fanout/logs` when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".fanout")
                .join("logs")
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
