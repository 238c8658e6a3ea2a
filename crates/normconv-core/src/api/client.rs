//! API client for the norm conversion service.
//!
//! This module provides the `ApiClient` struct for verifying API keys and
//! requesting norm conversions.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::convert::{
    SingleConvertRequest, SingleConvertResponse, UnifiedConvertRequest, UnifiedConvertResponse,
};
use crate::models::ToolId;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const VERIFY_PATH: &str = "/api/auth/verify";
const UNIFIED_CONVERT_PATH: &str = "/api/norm/convert";

/// API client for the scoring service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the service at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check an API key against the service. Success means the key is valid.
    pub async fn verify_key(&self, key: &str) -> Result<(), ApiError> {
        let url = self.url(VERIFY_PATH);
        debug!(url = %url, "Verifying API key");

        let response = self.client.get(&url).bearer_auth(key).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// Convert raw scores for every selected tool in one request.
    pub async fn convert_unified(
        &self,
        request: &UnifiedConvertRequest,
    ) -> Result<UnifiedConvertResponse, ApiError> {
        self.post(UNIFIED_CONVERT_PATH, request).await
    }

    /// Convert a single subtest score.
    pub async fn convert_tool(
        &self,
        request: &SingleConvertRequest,
    ) -> Result<SingleConvertResponse, ApiError> {
        let path = format!("/api/norm/{}/convert", request.tool);
        self.post(&path, request).await
    }

    /// Fetch the service's metadata for a tool (norm tables, labels).
    pub async fn fetch_metadata(&self, tool: ToolId) -> Result<Value, ApiError> {
        self.get(&format!("/api/norm/{}/metadata", tool)).await
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ApiError::InvalidResponse("API key contains invalid characters".into())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
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

    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
        url: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        debug!(url = %url, "GET response received");
        Self::parse(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        debug!(url = %url, "POST response received");
        Self::parse(response, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://example.test/").unwrap();
        assert_eq!(client.base_url(), "http://example.test");
        assert_eq!(client.url(VERIFY_PATH), "http://example.test/api/auth/verify");
    }

    #[test]
    fn test_with_token_shares_base_url() {
        let client = ApiClient::new(DEFAULT_BASE_URL).unwrap();
        assert!(!client.has_token());
        let authed = client.with_token("key".to_string());
        assert!(authed.has_token());
        assert_eq!(authed.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_auth_header_format() {
        let client = ApiClient::new(DEFAULT_BASE_URL).unwrap().with_token("abc".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");
    }
}
