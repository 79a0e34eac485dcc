//! Inbound messages from page scrapers.
//!
//! Scrapers speak a three-event protocol: zero or more `progress` reports
//! followed by one terminal `final` or `error` report. Reports name their
//! platform but not the query that caused them; the coordinator matches
//! them to whatever query is pending for that platform.

use serde::{Deserialize, Serialize};

/// A report emitted by a page scraper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScrapeReport {
    Progress { platform: String, text: String },
    Final { platform: String, text: String },
    Error { platform: String, error: String },
}

/// Message shape emitted by the original browser-extension scrapers.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum LegacyReport {
    #[serde(rename = "aiResponse")]
    Response {
        source: String,
        answer: String,
        #[serde(default, rename = "isStreaming")]
        is_streaming: bool,
    },
    #[serde(rename = "aiError")]
    Error { source: String, error: String },
}

impl From<LegacyReport> for ScrapeReport {
    fn from(report: LegacyReport) -> Self {
        match report {
            LegacyReport::Response {
                source,
                answer,
                is_streaming: true,
            } => Self::Progress {
                platform: source,
                text: answer,
            },
            LegacyReport::Response { source, answer, .. } => Self::Final {
                platform: source,
                text: answer,
            },
            LegacyReport::Error { source, error } => Self::Error {
                platform: source,
                error,
            },
        }
    }
}

impl ScrapeReport {
    /// Parse a raw JSON payload. Accepts both the native shape and the
    /// `aiResponse`/`aiError` shape used by browser-extension scrapers.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<ScrapeReport>(payload) {
            Ok(report) => Ok(report),
            Err(native_err) => serde_json::from_str::<LegacyReport>(payload)
                .map(Into::into)
                .map_err(|_| native_err),
        }
    }

    pub fn platform(&self) -> &str {
        match self {
            Self::Progress { platform, .. }
            | Self::Final { platform, .. }
            | Self::Error { platform, .. } => platform,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}
