//! In-memory transport for deterministic API tests
//!
//! `MockTransport` maps `"<METHOD> <url>"` to a canned response. Requests
//! nobody trained for fail with `TransportError::MissingExpectation`, and a
//! request body rejected by its validator panics, failing the test.
//! The registry is not keyed on headers: anonymous and authenticated calls to
//! the same endpoint hit the same entry.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::github::request::{HttpMethod, RequestDescriptor};
use crate::github::transport::{HttpResponse, Transport, TransportError};

type Validator = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct Expectation {
    status: u16,
    body: Vec<u8>,
    validator: Option<Validator>,
}

/// Transport that answers from trained expectations
#[derive(Default)]
pub struct MockTransport {
    expectations: Mutex<HashMap<String, Expectation>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method url` with `response` and status 200
    pub fn train(&self, method: HttpMethod, url: &str, response: &[u8]) {
        self.insert(method, url, 200, response, None);
    }

    /// Like `train`, but `validator` must accept the request body
    pub fn train_with_validator<F>(
        &self,
        method: HttpMethod,
        url: &str,
        response: &[u8],
        validator: F,
    ) where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.insert(method, url, 200, response, Some(Box::new(validator)));
    }

    /// Answer `method url` with a non-2xx status and body
    pub fn train_status(&self, method: HttpMethod, url: &str, status: u16, response: &[u8]) {
        self.insert(method, url, status, response, None);
    }

    /// Requests sent so far, in order
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn insert(
        &self,
        method: HttpMethod,
        url: &str,
        status: u16,
        body: &[u8],
        validator: Option<Validator>,
    ) {
        let expectation = Expectation {
            status,
            body: body.to_vec(),
            validator,
        };
        self.expectations
            .lock()
            .expect("mock registry poisoned")
            .insert(request_key(method, url), expectation);
    }
}

fn request_key(method: HttpMethod, url: &str) -> String {
    format!("{} {}", method, url)
}

impl Transport for MockTransport {
    fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, TransportError> {
        let key = request_key(request.method, &request.url);
        let expectations = self.expectations.lock().expect("mock registry poisoned");

        let expectation = expectations
            .get(&key)
            .ok_or_else(|| TransportError::MissingExpectation(key.clone()))?;

        if let Some(validator) = &expectation.validator {
            assert!(
                validator(&request.body_text()),
                "Request content did not match expected values for '{}'",
                key
            );
        }

        self.requests
            .lock()
            .expect("mock request log poisoned")
            .push(request.clone());

        if (200..300).contains(&expectation.status) {
            Ok(HttpResponse {
                status: expectation.status,
                body: expectation.body.clone(),
            })
        } else {
            Err(TransportError::Status {
                status: expectation.status,
                body: expectation.body.clone(),
            })
        }
    }
}
