//! CLI command definitions using clap
//!
//! Defines the command structure for the `ghapi` CLI tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// ghapi - GitHub API requests authenticated by git credential helpers
///
/// Credentials come from the `credential.helper` entries in your git config.
/// Requests are sent anonymously when no helper has a credential.
#[derive(Parser, Debug)]
#[command(name = "ghapi", version, about, long_about = None)]
pub struct Cli {
    /// Git repository whose credential helpers are used
    /// (defaults to the repository containing the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Override the API base URL from the configuration file
    #[arg(long, global = true, env = "GHAPI_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Location of the storage path for git repositories. DEPRECATED
    #[arg(long = "git-repo-storage", global = true, hide = true, value_name = "PATH")]
    pub git_repo_storage: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a GET request and print the response body
    Get {
        /// API path, e.g. /repos/owner/name/pulls/1
        path: String,
    },

    /// Send a POST request and print the response body
    Post(PostArgs),

    /// Inspect credential resolution
    Auth(AuthArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// POST request arguments
#[derive(Args, Debug)]
pub struct PostArgs {
    /// API path, e.g. /repos/owner/name/issues
    pub path: String,

    /// JSON request body
    #[arg(long, conflicts_with = "data_file", required_unless_present = "data_file")]
    pub data: Option<String>,

    /// File containing the JSON request body
    #[arg(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication commands
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Show which credential would be used for the API host
    Status,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        key: ConfigKey,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: ConfigKey,
    },

    /// Reset a configuration value to its default
    Remove {
        /// Configuration key
        key: ConfigKey,
    },

    /// Print the configuration file location
    Path,
}

/// Available configuration keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// API base URL
    #[value(name = "api-url")]
    ApiUrl,

    /// Repository storage location
    #[value(name = "repo-storage")]
    RepoStorage,

    /// HTTP timeout in seconds
    #[value(name = "http-timeout")]
    HttpTimeout,

    /// Credential helper timeout in seconds
    #[value(name = "helper-timeout")]
    HelperTimeout,
}
