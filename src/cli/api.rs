//! Request CLI command handlers

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::cli::commands::{Cli, PostArgs};
use crate::core::config::Config;
use crate::core::git::GitRepository;
use crate::error::{GhApiError, Result};
use crate::github::client::GitHubApiTransport;

/// Options shared by every command that talks to the API
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub repo: Option<PathBuf>,
    pub api_url: Option<String>,
    pub git_repo_storage: Option<PathBuf>,
}

impl From<&Cli> for ClientOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            repo: cli.repo.clone(),
            api_url: cli.api_url.clone(),
            git_repo_storage: cli.git_repo_storage.clone(),
        }
    }
}

/// Effective configuration: file values overridden by command-line flags
pub fn effective_config(options: &ClientOptions) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(api_url) = &options.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(storage) = &options.git_repo_storage {
        config.repo_storage = Some(storage.clone());
    }
    Ok(config)
}

/// Repository used as the credential helper conduit
///
/// An explicit `--repo` must be a repository; otherwise the current
/// directory is tried and global helpers are used outside any repository.
pub fn locate_repository(options: &ClientOptions) -> Result<Option<GitRepository>> {
    match &options.repo {
        Some(dir) => GitRepository::discover(dir).map(Some),
        None if GitRepository::is_git_repository() => GitRepository::open_current_dir().map(Some),
        None => {
            debug!("not inside a git repository, using global credential helpers");
            Ok(None)
        }
    }
}

/// Build the network client for the CLI
pub fn build_client(options: &ClientOptions) -> Result<GitHubApiTransport> {
    let config = effective_config(options)?;
    let repo = locate_repository(options)?;
    GitHubApiTransport::from_config(&config, repo.as_ref())
}

/// Handle `ghapi get`
pub fn handle_get(options: &ClientOptions, path: &str) -> Result<()> {
    let client = build_client(options)?;
    let body = client.get(path)?;
    write_body(&body)
}

/// Handle `ghapi post`
pub fn handle_post(options: &ClientOptions, args: PostArgs) -> Result<()> {
    let payload = read_payload(&args)?;
    let client = build_client(options)?;
    let body = client.post(&args.path, payload)?;
    write_body(&body)
}

/// Request body from `--data` or `--data-file`, checked to be JSON
fn read_payload(args: &PostArgs) -> Result<Vec<u8>> {
    let payload = match (&args.data, &args.data_file) {
        (Some(data), _) => data.as_bytes().to_vec(),
        (None, Some(file)) => fs::read(file)?,
        (None, None) => {
            return Err(GhApiError::InvalidInput(
                "A request body is required: pass --data or --data-file".to_string(),
            ))
        }
    };

    serde_json::from_slice::<serde_json::Value>(&payload).map_err(|e| {
        GhApiError::InvalidInput(format!("Request body is not valid JSON: {}", e))
    })?;
    Ok(payload)
}

fn write_body(body: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(body)?;
    if !body.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
