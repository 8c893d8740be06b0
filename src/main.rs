//! ghapi - GitHub API requests authenticated by git credential helpers
//!
//! A thin command-line front end over the `gh_api_transport` library.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gh_api_transport::cli::api::{self, ClientOptions};
use gh_api_transport::cli::commands::{Cli, Commands};
use gh_api_transport::cli::{auth, config};
use gh_api_transport::error::{GhApiError, Result};
use gh_api_transport::github::error_handler;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        handle_error(&e);
        std::process::exit(1);
    }
}

/// Print the error, plus guidance for API failures
fn handle_error(e: &GhApiError) {
    eprintln!("Error: {}", e);

    if let Some(kind) = e.api_failure() {
        if let Some(hint) = error_handler::hint(&kind) {
            eprintln!();
            eprintln!("  → {}", hint);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = ClientOptions::from(&cli);

    match cli.command {
        Commands::Get { path } => api::handle_get(&options, &path),
        Commands::Post(args) => api::handle_post(&options, args),
        Commands::Auth(args) => auth::handle_auth(&options, args.command),
        Commands::Config(args) => config::handle_config(&options, args.command),
    }
}
