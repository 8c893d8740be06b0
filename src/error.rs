//! Custom error types for gh-api-transport
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

use crate::github::error_handler::{self, ApiFailureKind};
use crate::github::transport::TransportError;

/// Main error type for the GitHub API transport
#[derive(Error, Debug)]
pub enum GhApiError {
    /// Not running in a git repository
    #[error("This directory is not a git repository.\n\n  → Pass --repo <dir> or run the command inside a git project.")]
    NotGitRepository,

    /// The credential helper could not be run or answered with garbage
    #[error("Credential helper failed: {0}\n\n  → Check the 'credential.helper' entries in your git config.")]
    CredentialBackend(String),

    /// No response was received from the API
    #[error("Network request failed: {0}\n\n  → Check your internet connection.")]
    Transport(TransportError),

    /// The API answered with a non-2xx status
    #[error(
        "GitHub API request failed with HTTP {status}: {}",
        error_handler::error_message(.body)
    )]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body, preserved verbatim
        body: Vec<u8>,
    },

    /// Base URL could not be parsed or has no host
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),

    /// Git operation error
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),
}

impl GhApiError {
    /// HTTP status of an API failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GhApiError::Api { status, .. } => Some(*status),
            GhApiError::Transport(TransportError::Body { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Classification of an API failure; `None` for local and network errors
    pub fn api_failure(&self) -> Option<ApiFailureKind> {
        match self {
            GhApiError::Api { status, body } => {
                Some(error_handler::classify_api_error(*status, body))
            }
            _ => None,
        }
    }

    /// True when GitHub signalled a primary or secondary rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self.api_failure(), Some(ApiFailureKind::RateLimited))
    }

    /// True for 401/403 responses that are not rate limiting
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.api_failure(),
            Some(
                ApiFailureKind::Unauthorized
                    | ApiFailureKind::Forbidden
                    | ApiFailureKind::OrgAccessRestricted { .. }
            )
        )
    }

    /// True for 404 responses
    pub fn is_not_found(&self) -> bool {
        matches!(self.api_failure(), Some(ApiFailureKind::NotFound))
    }
}

impl From<TransportError> for GhApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => GhApiError::Api { status, body },
            other => GhApiError::Transport(other),
        }
    }
}

impl From<toml::de::Error> for GhApiError {
    fn from(err: toml::de::Error) -> Self {
        GhApiError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for GhApiError {
    fn from(err: toml::ser::Error) -> Self {
        GhApiError::Toml(err.to_string())
    }
}

/// Result type alias using GhApiError
pub type Result<T> = std::result::Result<T, GhApiError>;
