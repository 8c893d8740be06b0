//! Transport capability
//!
//! `Transport` is the only seam with real I/O: it sends one
//! `RequestDescriptor` and hands back the raw response. `ReqwestTransport`
//! is the network implementation; tests substitute `MockTransport`.
//! There is no retry here, a call is a single attempt.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use thiserror::Error;
use tracing::debug;

use crate::github::request::{HttpMethod, RequestDescriptor};

/// Raw response returned by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure kinds a transport can report
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not reach the server
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request exceeded its time budget
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-2xx status
    #[error("server returned HTTP {status}")]
    Status { status: u16, body: Vec<u8> },

    /// The server answered but its body could not be read
    #[error("failed to read response body (HTTP {status}): {reason}")]
    Body { status: u16, reason: String },

    /// The request could not be constructed
    #[error("invalid request: {0}")]
    Request(String),

    /// A mock transport received a request nobody trained it for
    #[cfg(any(test, feature = "test-util"))]
    #[error("no mock expectation for '{0}'")]
    MissingExpectation(String),
}

/// Sends a request and returns the raw response
pub trait Transport: Send + Sync {
    fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Network transport using a blocking reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout and User-Agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(classify_send_error)?;
        let status = response.status().as_u16();
        debug!(method = %request.method, url = %request.url, status, "response received");

        let body = response
            .bytes()
            .map_err(|e| TransportError::Body {
                status,
                reason: e.to_string(),
            })?
            .to_vec();

        if (200..300).contains(&status) {
            Ok(HttpResponse { status, body })
        } else {
            Err(TransportError::Status { status, body })
        }
    }
}

fn classify_send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::Request(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
