//! Shared HTTP plumbing for feed adapters

use crate::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const CLIENT_USER_AGENT: &str = concat!("BullionDesk/", env!("CARGO_PKG_VERSION"));

/// Thin GET client bound to one feed base URL
#[derive(Clone)]
pub struct FeedHttpClient {
    client: Client,
    base_url: Url,
}

impl FeedHttpClient {
    pub fn new(base_url: Url, timeout: Duration, accept: &'static str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Resolve a path against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::Config(format!("Invalid feed path '{}': {}", path, e)))
    }

    /// GET a path and return the body text.
    ///
    /// Transport errors, timeouts and non-success statuses all surface as
    /// `FeedUnavailable`.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path)?;

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::FeedUnavailable(format!("Request to {} timed out", url))
            } else {
                AppError::FeedUnavailable(format!("Request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FeedUnavailable(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::FeedUnavailable(format!("Failed to read {}: {}", url, e)))
    }
}
