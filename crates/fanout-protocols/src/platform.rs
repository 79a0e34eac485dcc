//! Platform definitions.
//!
//! A platform is one supported third-party chat web application. The
//! coordinator only needs to know how to recognise its tab and which
//! scraper script to inject into it.

use serde::{Deserialize, Serialize};

use crate::pattern::MatchPattern;

/// Platform unique identifier type (e.g. "chatgpt").
pub type PlatformId = String;

/// Immutable description of a platform target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTarget {
    /// Platform ID.
    pub id: PlatformId,
    /// Display name.
    pub name: String,
    /// Page-match pattern used to locate the platform's tab.
    pub pattern: MatchPattern,
    /// Scraper script path, relative to the configured scripts directory.
    pub script: String,
}

impl PlatformTarget {
    /// Create a new platform target.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pattern: MatchPattern,
        script: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pattern,
            script: script.into(),
        }
    }

    /// Whether a tab URL belongs to this platform.
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.matches(url)
    }

    /// Site the user is asked to open and log into.
    pub fn site(&self) -> &str {
        self.pattern.site()
    }
}

/// Built-in platforms: (id, display name, match pattern).
pub const BUILTIN_PLATFORMS: &[(&str, &str, &str)] = &[
    ("chatgpt", "ChatGPT", "https://chatgpt.com/*"),
    ("gemini", "Gemini", "https://gemini.google.com/*"),
    ("grok", "Grok", "https://x.com/i/grok*"),
    ("kimi", "Kimi", "https://kimi.moonshot.cn/*"),
];

/// Default scraper script location for a platform id.
pub fn default_script(id: &str) -> String {
    format!("content_{}.js", id)
}

/// Whether `id` names a built-in platform.
pub fn is_builtin(id: &str) -> bool {
    BUILTIN_PLATFORMS.iter().any(|(builtin, _, _)| *builtin == id)
}

/// The built-in platform targets.
pub fn builtin_targets() -> Vec<PlatformTarget> {
    BUILTIN_PLATFORMS
        .iter()
        .filter_map(|(id, name, pattern)| {
            MatchPattern::parse(pattern)
                .ok()
                .map(|pattern| PlatformTarget::new(*id, *name, pattern, default_script(id)))
        })
        .collect()
}
