//! HTTP client trait abstraction.
//!
//! The coordinator never talks to reqwest directly; it goes through
//! [`HttpClient`] so tests can script every remote answer. Timeouts are the
//! implementation's concern, not the caller's.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a 200 response carrying a JSON document.
    pub fn json_ok(value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::with_headers(200, headers, Bytes::from(value.to_string()))
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string, replacing invalid UTF-8.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A request that never got an answer from the server.
///
/// Non-2xx statuses are not errors at this layer; they come back as a
/// [`Response`] for the caller to interpret.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request timeout: {0}")]
    Timeout(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The response body could not be read off the wire.
    #[error("Body read failed: {0}")]
    Body(String),
    #[error("HTTP error: {0}")]
    Other(String),
}

/// Trait for HTTP client operations.
///
/// Implementations return `Ok` for every response the server produced,
/// including non-2xx statuses; `Err` is reserved for requests that never
/// got an answer.
///
/// # Example
///
/// ```ignore
/// use cosmetica_auth::traits::{HttpClient, Headers, HttpError};
///
/// async fn fetch<C: HttpClient>(client: &C) -> Result<String, HttpError> {
///     let response = client.get("https://api.cosmetica.cc/v2/get/uuid", &Headers::new()).await?;
///     Ok(response.text_lossy())
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a POST request with a string body.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;
}
