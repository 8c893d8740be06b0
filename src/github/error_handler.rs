//! GitHub API error detection and classification
//!
//! GitHub encodes failure detail in the response body as JSON
//! (`{"message": ..., "documentation_url": ...}`). This module decodes that
//! body and maps status + message onto a small set of failure kinds so callers
//! can tell authentication problems from rate limits and server faults.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Regex pattern to extract organization name from OAuth access restriction errors
static ORG_RESTRICTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"the `([^`]+)` organization has enabled OAuth App access restrictions"#)
        .expect("Invalid regex pattern for org restriction detection")
});

/// Error body returned by the GitHub REST API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message
    pub message: String,
    /// Link to the relevant documentation page
    #[serde(default)]
    pub documentation_url: Option<String>,
    /// Field-level validation errors (422 responses)
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// Coarse classification of a non-2xx API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailureKind {
    /// 401: missing or bad credentials
    Unauthorized,
    /// 403 that is not a rate limit or org restriction
    Forbidden,
    /// 403 caused by an organization's OAuth App policy
    OrgAccessRestricted {
        /// Organization name extracted from the message
        org: String,
    },
    /// 429, or 403 with a rate limit message
    RateLimited,
    /// 404
    NotFound,
    /// 422
    Validation,
    /// 5xx
    Server,
    /// Anything else
    Other,
}

/// Decode a GitHub error body, if it is one
pub fn parse_error_body(body: &[u8]) -> Option<ApiErrorBody> {
    serde_json::from_slice(body).ok()
}

/// Best-effort message for display: the JSON `message` field, or the raw
/// body as text
pub fn error_message(body: &[u8]) -> String {
    match parse_error_body(body) {
        Some(parsed) => parsed.message,
        None => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                "<empty response body>".to_string()
            } else {
                text
            }
        }
    }
}

/// Classifies a failed response from status and body
pub fn classify_api_error(status: u16, body: &[u8]) -> ApiFailureKind {
    let message = error_message(body);

    match status {
        401 => ApiFailureKind::Unauthorized,
        403 => {
            if is_rate_limit_error(&message) {
                ApiFailureKind::RateLimited
            } else if let Some(org) = extract_org_from_access_error(&message) {
                ApiFailureKind::OrgAccessRestricted { org }
            } else {
                ApiFailureKind::Forbidden
            }
        }
        404 => ApiFailureKind::NotFound,
        422 => ApiFailureKind::Validation,
        429 => ApiFailureKind::RateLimited,
        500..=599 => ApiFailureKind::Server,
        _ => ApiFailureKind::Other,
    }
}

/// Actionable guidance for a failure kind, shown by the CLI
pub fn hint(kind: &ApiFailureKind) -> Option<String> {
    match kind {
        ApiFailureKind::Unauthorized => Some(
            "The stored credential was rejected. Update it with 'git credential approve' or your helper's own tooling."
                .to_string(),
        ),
        ApiFailureKind::Forbidden => {
            Some("The credential does not grant access to this resource.".to_string())
        }
        ApiFailureKind::OrgAccessRestricted { org } => Some(format!(
            "The '{}' organization restricts OAuth App access. Use a Personal Access Token in your credential helper.",
            org
        )),
        ApiFailureKind::RateLimited => {
            Some("API rate limit exceeded. Wait a few minutes and try again.".to_string())
        }
        ApiFailureKind::NotFound => Some(
            "Resource not found. It may be private and the request may have been anonymous."
                .to_string(),
        ),
        _ => None,
    }
}

/// Extract organization name from OAuth access restriction error message
fn extract_org_from_access_error(error_message: &str) -> Option<String> {
    // Quick check before running regex
    if !error_message.contains("OAuth App access restrictions") {
        return None;
    }

    ORG_RESTRICTION_PATTERN
        .captures(error_message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check if error is a rate limit error
fn is_rate_limit_error(error_message: &str) -> bool {
    let lower = error_message.to_lowercase();
    lower.contains("rate limit")
}
