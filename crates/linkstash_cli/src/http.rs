//! Blocking reqwest transport for the CLI.

use linkstash_engine::{HttpClient, HttpResponse};
use std::time::Duration;

/// An [`HttpClient`] backed by a blocking reqwest client.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with a 30-second request timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post(&self, url: &str, bearer: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {bearer}"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let bytes = response.bytes().map_err(|e| e.to_string())?;
        Ok(HttpResponse::new(status, bytes.to_vec()))
    }

    fn is_online(&self) -> bool {
        // Reachability surfaces as a request failure instead.
        true
    }
}
