//! DevTools HTTP discovery endpoints (`/json/*`).

use reqwest::StatusCode;
use tracing::debug;

use super::error::CdpError;
use super::protocol::{BrowserVersion, PageInfo};

/// Client for the DevTools HTTP endpoints of a running Chrome.
#[derive(Debug, Clone)]
pub struct DevToolsHttp {
    endpoint: String,
    client: reqwest::Client,
}

impl DevToolsHttp {
    /// Create a client for e.g. `http://localhost:9222`.
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch browser version info, including the browser WebSocket URL.
    ///
    /// Any failure here means Chrome is not reachable with remote debugging.
    pub async fn version(&self) -> Result<BrowserVersion, CdpError> {
        let url = format!("{}/json/version", self.endpoint);
        debug!("Fetching browser version from {}", url);

        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", self.endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", self.endpoint, e)))
    }

    /// List page targets. Workers, iframes and extension pages are skipped.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.endpoint);
        let targets: Vec<PageInfo> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", self.endpoint, e)))?
            .json()
            .await?;
        Ok(targets.into_iter().filter(PageInfo::is_page).collect())
    }

    /// Bring a page to the foreground and focus its window.
    pub async fn activate(&self, target_id: &str) -> Result<(), CdpError> {
        let url = format!("{}/json/activate/{}", self.endpoint, target_id);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(CdpError::PageNotFound(target_id.to_string())),
            status => Err(CdpError::Http(format!(
                "activate {} returned {}",
                target_id, status
            ))),
        }
    }
}
