//! Authentication CLI command handlers

use crate::cli::api::{effective_config, locate_repository, ClientOptions};
use crate::cli::commands::AuthCommand;
use crate::core::credentials::{mask_secret, CredentialSource, GitCredentialStore};
use crate::error::Result;
use crate::github::request::RequestBuilder;

/// Handle authentication commands
pub fn handle_auth(options: &ClientOptions, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::Status => handle_status(options),
    }
}

/// Resolve the credential exactly as a request would and report it
fn handle_status(options: &ClientOptions) -> Result<()> {
    let config = effective_config(options)?;
    let host = RequestBuilder::new(&config.api_url)?.host().to_string();
    let repo = locate_repository(options)?;

    let store = match &repo {
        Some(repo) => GitCredentialStore::new(repo),
        None => GitCredentialStore::global(),
    }
    .with_timeout(config.credential_helper_timeout());

    println!("Authentication Status:");
    println!("  API host: {}", host);
    match &repo {
        Some(repo) => println!("  Helpers from: {}", repo.git_dir().display()),
        None => println!("  Helpers from: global git config"),
    }

    match store.resolve(&host)? {
        Some(credential) => {
            println!("  Credential: {}", credential.username);
            println!("  Secret: {}", mask_secret(&credential.secret));
        }
        None => {
            println!("  Credential: none (requests are sent anonymously)");
        }
    }

    Ok(())
}
