//! CLI module for gh-api-transport
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;

pub use commands::{Cli, Commands};
