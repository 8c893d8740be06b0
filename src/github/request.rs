//! Request construction
//!
//! A `RequestDescriptor` is plain data: method, absolute URL, headers and an
//! optional body. It is built fresh for every call and never mutated after.
//! Whether it carries an `Authorization` header depends only on the
//! credential handed to `RequestBuilder::build` for that call.

use std::collections::BTreeMap;
use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use secrecy::ExposeSecret;
use url::Url;

use crate::core::credentials::Credential;
use crate::error::{GhApiError, Result};

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";

/// Media type GitHub recommends for REST calls
const GITHUB_JSON: &str = "application/vnd.github+json";

/// HTTP method for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request described as plain data
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    /// Header value by exact name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_authenticated(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    /// Body as text, empty when absent
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name == AUTHORIZATION {
                    (name.as_str(), "[REDACTED]")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

/// Builds request descriptors against a fixed API base URL
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    host: String,
}

impl RequestBuilder {
    /// Create a builder for `base_url`, e.g. `https://api.github.com`
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| GhApiError::InvalidApiUrl(format!("{}: {}", base_url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| GhApiError::InvalidApiUrl(format!("{}: missing host", base_url)))?;
        // Helpers key credentials on host:port when the port is not the default
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
        })
    }

    /// Host credentials are resolved for
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path; a missing leading slash is added
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Build a request descriptor
    ///
    /// GET requests must not carry a body and POST requests must. The
    /// `Authorization` header is present exactly when `credential` is.
    pub fn build(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Vec<u8>>,
        credential: Option<&Credential>,
    ) -> Result<RequestDescriptor> {
        let mut headers = BTreeMap::new();
        headers.insert(ACCEPT.to_string(), GITHUB_JSON.to_string());

        match (method, &body) {
            (HttpMethod::Get, Some(_)) => {
                return Err(GhApiError::InvalidInput(
                    "GET requests cannot carry a body".to_string(),
                ))
            }
            (HttpMethod::Post, None) => {
                return Err(GhApiError::InvalidInput(
                    "POST requests require a body".to_string(),
                ))
            }
            (HttpMethod::Post, Some(_)) => {
                headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
            }
            (HttpMethod::Get, None) => {}
        }

        if let Some(credential) = credential {
            headers.insert(AUTHORIZATION.to_string(), basic_auth(credential));
        }

        Ok(RequestDescriptor {
            method,
            url: self.url_for(path),
            headers,
            body,
        })
    }
}

/// `Basic base64(username:secret)`
pub fn basic_auth(credential: &Credential) -> String {
    let pair = format!(
        "{}:{}",
        credential.username,
        credential.secret.expose_secret()
    );
    format!("Basic {}", BASE64.encode(pair))
}
