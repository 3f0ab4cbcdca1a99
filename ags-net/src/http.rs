// ags-net/src/http.rs
use std::time::Duration;

use ags_common::error::{AgsError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::location::Location;

const DOWNLOAD_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 15;
const USER_AGENT_STRING: &str = concat!("ags/", env!("CARGO_PKG_VERSION"), " (agent catalog sync)");

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| AgsError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Performs a GET and returns the whole body. Every failure surfaces as
/// `AgsError::Transport` so callers can decide whether to retry.
pub async fn fetch_bytes(client: &Client, location: &Location) -> Result<Vec<u8>> {
    let url = location.as_str();
    let transport_err = |reason: String| AgsError::Transport {
        location: url.to_string(),
        reason,
    };

    let response = client.get(location.url().clone()).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        transport_err(format!("HTTP request failed: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        return Err(match status {
            StatusCode::NOT_FOUND => transport_err("Resource not found (404)".to_string()),
            StatusCode::FORBIDDEN => transport_err("Access forbidden (403)".to_string()),
            _ => transport_err(format!("HTTP error {status}")),
        });
    }

    let content = response
        .bytes()
        .await
        .map_err(|e| transport_err(format!("Failed to read response body bytes: {e}")))?;
    debug!("Fetched {} bytes from {}", content.len(), url);
    Ok(content.to_vec())
}
