//! API client for the National Park Service data API.
//!
//! This module provides the `ParksClient` struct for the one request the
//! application makes: the campground listing.

use reqwest::{header, Client, Url};
use tracing::{debug, info, warn};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the NPS data API
pub const API_BASE_URL: &str = "https://developer.nps.gov/api/v1";

/// Path of the campground listing, relative to the base URL
const CAMPGROUNDS_PATH: &str = "campgrounds";

/// User agent sent with every request
const USER_AGENT: &str = concat!("campcache/", env!("CARGO_PKG_VERSION"));

/// API client for the NPS data API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ParksClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for ParksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParksClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ParksClient {
    /// Create a client against the public NPS endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(API_BASE_URL, api_key)
    }

    /// Create a client against an arbitrary base URL (mirrors, test servers)
    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        // A trailing slash keeps `Url::join` from dropping the last path segment
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        // No timeout: the transport default applies
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Listing URL without the key, safe to log
    pub fn endpoint(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(CAMPGROUNDS_PATH);
        }
        url
    }

    /// Full listing URL including the `api_key` query parameter
    pub fn campgrounds_url(&self) -> Url {
        let mut url = self.endpoint();
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch the campground listing and return the raw response body.
    ///
    /// Issues exactly one GET. There is no retry or backoff; the caller
    /// decides what a failure means. Transport errors have the request URL
    /// stripped so the API key never reaches a log line.
    pub async fn fetch_campgrounds(&self) -> Result<String, ApiError> {
        let endpoint = self.endpoint();
        debug!(url = %endpoint, "Fetching campgrounds");

        let response = self
            .client
            .get(self.campgrounds_url())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(url = %endpoint, error = %e, "Campground request failed");
                ApiError::Network(e)
            })?;

        let response = Self::check_response(response).await.map_err(|e| {
            warn!(url = %endpoint, status = ?e.status(), error = %e, "Campground request rejected");
            e
        })?;

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            warn!(url = %endpoint, error = %e, "Failed to read campground response body");
            ApiError::Network(e)
        })?;

        info!(bytes = body.len(), "Successfully fetched campgrounds");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campgrounds_url_embeds_key() {
        let client = ParksClient::new("DEMO_KEY").expect("client");
        assert_eq!(
            client.campgrounds_url().as_str(),
            "https://developer.nps.gov/api/v1/campgrounds?api_key=DEMO_KEY"
        );
    }

    #[test]
    fn test_endpoint_omits_key() {
        let client = ParksClient::new("secret").expect("client");
        assert!(!client.endpoint().as_str().contains("secret"));
        assert!(!format!("{:?}", client).contains("secret"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let a = ParksClient::with_base_url("http://127.0.0.1:9000/api/v1", "k").expect("client");
        let b = ParksClient::with_base_url("http://127.0.0.1:9000/api/v1/", "k").expect("client");
        assert_eq!(a.campgrounds_url(), b.campgrounds_url());
        assert_eq!(a.endpoint().path(), "/api/v1/campgrounds");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ParksClient::with_base_url("not a url", "k");
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_key_is_query_encoded() {
        let client = ParksClient::new("a b&c").expect("client");
        assert!(client.campgrounds_url().as_str().ends_with("api_key=a+b%26c"));
    }
}
