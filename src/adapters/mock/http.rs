//! Mock HTTP client for testing.
//!
//! Responses are configured per URL (exact match first, then prefix match),
//! optionally as a queue consumed one request at a time. Every request is
//! recorded so tests can count calls per endpoint.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response (any status)
    Success(Response),
    /// Fail the request without a response
    Error(HttpError),
}

impl MockResponse {
    /// A 200 response carrying `value` as JSON.
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_ok(&value))
    }

    /// A response with an arbitrary status and raw body.
    pub fn status(status: u16, body: &str) -> Self {
        MockResponse::Success(Response::new(status, body.to_string()))
    }

    /// A connection failure.
    pub fn refused() -> Self {
        MockResponse::Error(HttpError::ConnectionFailed("connection refused".to_string()))
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use cosmetica_auth::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.test/v2/get/uuid",
///     MockResponse::json(serde_json::json!({"uuid": "..."})),
/// );
/// client.push_response(
///     "https://api.test/v2/client/usersettings",
///     MockResponse::refused(),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// One-shot responses consumed before `responses`
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Artificial latency applied to every request
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Set a response for a URL or URL prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a one-shot response for a URL or URL prefix.
    ///
    /// Queued responses are served in order before falling back to
    /// [`set_response`](Self::set_response) and the default.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        let mut queued = self.queued.lock().unwrap();
        queued.entry(url.to_string()).or_default().push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Delay every request by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of recorded requests whose URL contains `fragment`.
    pub fn count_requests(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }

    /// Recorded requests whose URL contains `fragment`.
    pub fn requests_to(&self, fragment: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .cloned()
            .collect()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Clear all configured responses, queued ones included.
    pub fn clear_responses(&self) {
        self.responses.lock().unwrap().clear();
        self.queued.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        {
            let mut queued = self.queued.lock().unwrap();
            let key = if queued.get(url).is_some_and(|q| !q.is_empty()) {
                Some(url.to_string())
            } else {
                queued
                    .iter()
                    .find(|(pattern, q)| url.starts_with(pattern.as_str()) && !q.is_empty())
                    .map(|(pattern, _)| pattern.clone())
            };
            if let Some(response) = key.and_then(|k| queued.get_mut(&k)?.pop_front()) {
                return Some(response);
            }
        }

        let responses = self.responses.lock().unwrap();
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }
        // Longest matching prefix wins.
        if let Some((_, response)) = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
        {
            return Some(response.clone());
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    async fn respond(&self, url: &str) -> Result<Response, HttpError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers, None);
        self.respond(url).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));
        self.respond(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_mock_http_client_default() {
        let client = MockHttpClient::default();
        assert!(client.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_with_response() {
        let client = MockHttpClient::new();
        client.set_response("https://example.com/test", MockResponse::status(200, "Hello"));

        let response = client
            .get("https://example.com/test", &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from("Hello"));

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
    }

    #[tokio::test]
    async fn test_post_records_body() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::json(serde_json::json!({"ok": true})));

        client
            .post("https://example.com/api", r#"{"name":"test"}"#, &Headers::new())
            .await
            .unwrap();

        let requests = client.get_requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].body, Some(r#"{"name":"test"}"#.to_string()));
    }

    #[tokio::test]
    async fn test_refused() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::refused());

        let result = client.get("https://example.com/x", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client.get("https://example.com/missing", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[tokio::test]
    async fn test_queue_consumed_in_order_then_falls_back() {
        let client = MockHttpClient::new();
        client.set_response("https://example.com/s", MockResponse::status(200, "steady"));
        client.push_response("https://example.com/s", MockResponse::status(500, "first"));
        client.push_response("https://example.com/s", MockResponse::refused());

        let first = client.get("https://example.com/s", &Headers::new()).await.unwrap();
        assert_eq!(first.status, 500);
        assert!(client.get("https://example.com/s", &Headers::new()).await.is_err());
        let third = client.get("https://example.com/s", &Headers::new()).await.unwrap();
        assert_eq!(third.text_lossy(), "steady");
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let client = MockHttpClient::new();
        client.set_response("https://example.com/api", MockResponse::status(200, "short"));
        client.set_response("https://example.com/api/v1", MockResponse::status(200, "long"));

        let response = client
            .get("https://example.com/api/v1/users", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.text_lossy(), "long");
    }

    #[tokio::test]
    async fn test_count_requests() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::status(200, ""));

        client.get("https://example.com/a", &Headers::new()).await.unwrap();
        client.get("https://example.com/a?x=1", &Headers::new()).await.unwrap();
        client.get("https://example.com/b", &Headers::new()).await.unwrap();

        assert_eq!(client.count_requests("/a"), 2);
        assert_eq!(client.requests_to("/b").len(), 1);

        client.clear_requests();
        assert_eq!(client.count_requests("/a"), 0);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::status(200, "Hello"));

        let cloned = client.clone();
        cloned.get("https://example.com", &Headers::new()).await.unwrap();

        assert_eq!(client.get_requests().len(), 1);
    }
}
