//! Core functionality for gh-api-transport
//!
//! This module contains the local side of the transport:
//! - Git repository access (credential helper configuration)
//! - Credential resolution through git credential helpers
//! - Application configuration

pub mod config;
pub mod credentials;
pub mod git;

pub use config::Config;
pub use credentials::{Credential, CredentialSource, GitCredentialStore};
pub use git::GitRepository;
