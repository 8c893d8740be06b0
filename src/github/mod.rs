//! GitHub API integration module
//!
//! This module provides the remote side of the transport:
//! - Request construction with Basic authentication
//! - The `Transport` capability and its reqwest implementation
//! - The credential-backed API client
//! - Error classification
//! - An in-memory mock transport for tests

pub mod client;
pub mod error_handler;
pub mod request;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

pub use client::GitHubApiTransport;
pub use error_handler::{classify_api_error, ApiFailureKind};
pub use request::{HttpMethod, RequestBuilder, RequestDescriptor};
#[cfg(any(test, feature = "test-util"))]
pub use testing::MockTransport;
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
