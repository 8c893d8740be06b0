//! gh-api-transport - credential-backed GitHub API transport
//!
//! Issues GET/POST requests to the GitHub REST API, sourcing credentials from
//! the git credential helpers the user already has configured. Requests go
//! out anonymously when no credential exists.

pub mod cli;
pub mod core;
pub mod error;
pub mod github;

pub use error::{GhApiError, Result};
