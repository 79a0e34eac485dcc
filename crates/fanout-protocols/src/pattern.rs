//! URL match patterns.
//!
//! Follows the browser extension match-pattern grammar:
//!
//! ```text
//! <url-pattern> := <scheme>://<host><path> | <all_urls>
//! <scheme>      := '*' | 'http' | 'https' | 'ws' | 'wss' | 'file' | 'ftp'
//! <host>        := '*' | '*.' <any char except '/' and '*'>+ | <exact host>
//! <path>        := '/' <any chars, '*' matches any run>
//! ```
//!
//! The path part is matched against the URL path plus its query string. A
//! `*` scheme only matches `http` and `https`.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PatternError;

const ALL_URLS: &str = "<all_urls>";
const SCHEMES: [&str; 7] = ["*", "http", "https", "ws", "wss", "file", "ftp"];

#[derive(Debug, Clone)]
enum HostMatch {
    Any,
    Exact(String),
    Subdomains(String),
}

#[derive(Debug, Clone)]
enum PatternKind {
    AllUrls,
    Url {
        scheme: String,
        host: HostMatch,
        path: Regex,
    },
}

/// A parsed page-match pattern such as `https://chatgpt.com/*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchPattern {
    raw: String,
    kind: PatternKind,
}

impl MatchPattern {
    /// Parse a match pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let raw = pattern.trim().to_string();
        if raw == ALL_URLS {
            return Ok(Self {
                raw,
                kind: PatternKind::AllUrls,
            });
        }

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| PatternError::MissingScheme(raw.clone()))?;

        let scheme = scheme.to_ascii_lowercase();
        if !SCHEMES.contains(&scheme.as_str()) {
            return Err(PatternError::InvalidScheme {
                scheme,
                pattern: raw.clone(),
            });
        }

        let slash = rest
            .find('/')
            .ok_or_else(|| PatternError::MissingPath(raw.clone()))?;
        let (host, path) = rest.split_at(slash);
        let host = Self::parse_host(host, &scheme, &raw)?;

        Ok(Self {
            kind: PatternKind::Url {
                scheme,
                host,
                path: Self::path_regex(path),
            },
            raw,
        })
    }

    fn parse_host(host: &str, scheme: &str, raw: &str) -> Result<HostMatch, PatternError> {
        let host = host.to_ascii_lowercase();
        let invalid = || PatternError::InvalidHost {
            host: host.clone(),
            pattern: raw.to_string(),
        };

        if host == "*" {
            return Ok(HostMatch::Any);
        }
        if let Some(domain) = host.strip_prefix("*.") {
            if domain.is_empty() || domain.contains('*') {
                return Err(invalid());
            }
            return Ok(HostMatch::Subdomains(domain.to_string()));
        }
        if host.contains('*') || (host.is_empty() && scheme != "file") {
            return Err(invalid());
        }
        Ok(HostMatch::Exact(host))
    }

    fn path_regex(path: &str) -> Regex {
        let body = path
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        // Escaped literals joined by `.*` always form a valid expression.
        Regex::new(&format!("^{}$", body)).expect("escaped path pattern is a valid regex")
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Human-readable site for "please open and log in" messages: the
    /// pattern with a trailing `*` or `/*` removed.
    pub fn site(&self) -> &str {
        let site = self.raw.strip_suffix('*').unwrap_or(&self.raw);
        site.strip_suffix('/').unwrap_or(site)
    }

    /// Whether `url` matches this pattern. Unparsable URLs never match.
    pub fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        match &self.kind {
            PatternKind::AllUrls => matches!(parsed.scheme(), "http" | "https"),
            PatternKind::Url { scheme, host, path } => {
                let scheme_ok = if scheme == "*" {
                    matches!(parsed.scheme(), "http" | "https")
                } else {
                    parsed.scheme() == scheme
                };
                if !scheme_ok {
                    return false;
                }

                let url_host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
                let host_ok = match host {
                    HostMatch::Any => true,
                    HostMatch::Exact(h) => &url_host == h,
                    HostMatch::Subdomains(domain) => {
                        url_host == *domain || url_host.ends_with(&format!(".{}", domain))
                    }
                };
                if !host_ok {
                    return false;
                }

                let target = match parsed.query() {
                    Some(query) => format!("{}?{}", parsed.path(), query),
                    None => parsed.path().to_string(),
                };
                path.is_match(&target)
            }
        }
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for MatchPattern {}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for MatchPattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MatchPattern> for String {
    fn from(pattern: MatchPattern) -> Self {
        pattern.raw
    }
}

impl std::str::FromStr for MatchPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
