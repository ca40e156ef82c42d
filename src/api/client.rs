//! HTTP client for the Steam Web API and the storefront API.
//!
//! This module provides the `WebApiClient`, the reqwest-backed
//! implementation of the [`SteamApi`] transport seam. The Web API
//! authenticates with a plain `key` query parameter; the storefront API is
//! unauthenticated.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;

use super::{ApiError, Payload, SteamApi};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Steam Web API (schema, stats, achievements)
const API_BASE_URL: &str = "https://api.steampowered.com";

/// Base URL for the storefront API (appdetails)
const STORE_BASE_URL: &str = "https://store.steampowered.com/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for Steam.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct WebApiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    language: Option<String>,
}

impl WebApiClient {
    /// Create a client without an API key. Public endpoints (schema, global
    /// percentages, store metadata) work keyless; per-user endpoints do not.
    pub fn new() -> Result<Self> {
        Self::build(None, None)
    }

    /// Create a client with a Web API key.
    pub fn with_key(api_key: impl Into<String>) -> Result<Self> {
        Self::build(Some(api_key.into()), None)
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(config.api_key.clone(), config.language.clone())
    }

    fn build(api_key: Option<String>, language: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            language,
        })
    }

    fn api_url(interface: &str, method: &str, version: &str) -> String {
        format!("{}/{}/{}/{}/", API_BASE_URL, interface, method, version)
    }

    fn store_url(endpoint: &str) -> String {
        format!("{}/{}", STORE_BASE_URL, endpoint)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_payload(&self, url: &str, query: &[(&str, String)]) -> Result<Payload> {
        debug!(url = url, "Sending GET request");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        let value: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))?;

        Ok(Payload::new(value))
    }
}

impl SteamApi for WebApiClient {
    async fn call(
        &self,
        interface: &str,
        method: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<Payload> {
        let url = Self::api_url(interface, method, version);

        let mut query: Vec<(&str, String)> = Vec::with_capacity(params.len() + 2);
        if let Some(ref key) = self.api_key {
            query.push(("key", key.clone()));
        }
        query.push(("format", "json".to_string()));
        query.extend(params.iter().cloned());

        self.get_payload(&url, &query).await
    }

    async fn store_call(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Payload> {
        let url = Self::store_url(endpoint);

        let mut query: Vec<(&str, String)> = params.to_vec();
        if let Some(ref language) = self.language {
            if !query.iter().any(|(name, _)| *name == "l") {
                query.push(("l", language.clone()));
            }
        }

        self.get_payload(&url, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_layout() {
        assert_eq!(
            WebApiClient::api_url("ISteamUserStats", "GetSchemaForGame", "v2"),
            "https://api.steampowered.com/ISteamUserStats/GetSchemaForGame/v2/"
        );
        assert_eq!(
            WebApiClient::store_url("appdetails"),
            "https://store.steampowered.com/api/appdetails"
        );
    }

    #[test]
    fn test_client_builds_without_key() {
        let client = WebApiClient::new().expect("client should build");
        assert!(client.api_key.is_none());

        let keyed = WebApiClient::with_key("XYZ").expect("client should build");
        assert_eq!(keyed.api_key.as_deref(), Some("XYZ"));
    }
}
