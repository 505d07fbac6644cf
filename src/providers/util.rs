use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("aurum/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Sends the request and decodes a JSON body, failing on non-2xx statuses.
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder, source: &str) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| anyhow!("Request error for {}: {}", source, e))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} from {}", response.status(), source));
    }

    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {source}"))?;
    debug!(source, body = %text, "Received price response");

    serde_json::from_str(&text).map_err(|e| {
        error!(error = ?e, response = %text, source, "Failed to parse price response");
        anyhow!("Failed to parse JSON response from {}: {}", source, e)
    })
}
