//! HTTP client seam for the sync engine.
//!
//! The engine speaks JSON over a single `POST /sync` call shape. The
//! actual HTTP stack is abstracted behind a trait so different clients
//! (reqwest in the CLI, a scripted mock in tests) can plug in; the engine
//! owns all interpretation of status codes and bodies.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// A raw HTTP response: status code plus body bytes.
///
/// The engine interprets the status itself (401 is distinguished, other
/// non-2xx carry an optional `{"error": …}` body), so the transport hands
/// back non-success responses rather than turning them into errors.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response from a status and body.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Creates a response with a JSON-serialized body.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be serialized; intended for test setup.
    pub fn json(status: u16, value: &impl serde::Serialize) -> Self {
        Self {
            status,
            body: serde_json::to_vec(value).expect("serializable response body"),
        }
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. A transport
/// error (connection refused, DNS failure, timeout) is a `String`; any
/// received response - success or not - comes back as [`HttpResponse`].
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with a bearer credential and a JSON body.
    fn post(&self, url: &str, bearer: &str, body: Vec<u8>) -> Result<HttpResponse, String>;

    /// Reports whether the network is currently reachable.
    fn is_online(&self) -> bool;
}

/// One request captured by [`MockHttpClient`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL.
    pub url: String,
    /// Bearer token sent with the request.
    pub bearer: String,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Decodes the body as a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A scriptable HTTP client for testing.
///
/// Responses are consumed in FIFO order; every request is recorded for
/// later inspection.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    online: AtomicBool,
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    /// Creates a new mock client, online, with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Sets the reachability flag.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Returns all requests seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl HttpClient for MockHttpClient {
    fn post(&self, url: &str, bearer: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            bearer: bearer.to_string(),
            body,
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".into()))
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_replays_responses_in_order() {
        let client = MockHttpClient::new();
        client.push_response(HttpResponse::new(200, b"one".to_vec()));
        client.push_response(HttpResponse::new(500, b"two".to_vec()));

        let first = client.post("http://s/sync", "tok", vec![]).unwrap();
        let second = client.post("http://s/sync", "tok", vec![]).unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(second.status, 500);
    }

    #[test]
    fn mock_records_requests() {
        let client = MockHttpClient::new();
        client.push_response(HttpResponse::new(200, vec![]));
        client
            .post("http://s/sync", "bearer-token", b"{}".to_vec())
            .unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://s/sync");
        assert_eq!(requests[0].bearer, "bearer-token");
    }

    #[test]
    fn mock_without_script_errors() {
        let client = MockHttpClient::new();
        assert!(client.post("http://s/sync", "tok", vec![]).is_err());
    }

    #[test]
    fn mock_online_flag() {
        let client = MockHttpClient::new();
        assert!(client.is_online());
        client.set_online(false);
        assert!(!client.is_online());
    }
}
