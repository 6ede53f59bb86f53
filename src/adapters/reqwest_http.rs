//! Reqwest-based HTTP client adapter.
//!
//! The coordinator sets no timeouts of its own; this adapter does.

use async_trait::async_trait;
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// Request timeout used by [`ReqwestHttpClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = concat!("cosmetica-auth/", env!("CARGO_PKG_VERSION"));

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use cosmetica_auth::adapters::ReqwestHttpClient;
/// use cosmetica_auth::traits::{Headers, HttpClient};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.get("https://api.cosmetica.cc/v2/get/uuid", &Headers::new()).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client with [`DEFAULT_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self { client }
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            HttpError::Body(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        headers
            .iter()
            .fold(builder, |builder, (key, value)| builder.header(key, value))
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response, HttpError> {
        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.get(url), headers);
        self.send(builder).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.post(url).body(body.to_string()), headers);
        self.send(builder).await
    }
}
