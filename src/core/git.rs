//! Local git repository access
//!
//! The repository is only used as a conduit to git's configuration: it tells
//! us which credential helpers the user has configured. The wrapper stores
//! the repository location rather than an open handle so it can be shared
//! between threads; git config is re-read on every lookup.

use std::path::{Path, PathBuf};

use git2::{Config, ConfigLevel, Repository};

use crate::error::{GhApiError, Result};

/// Config key holding the generic credential helper list
const HELPER_KEY: &str = "credential.helper";

/// Wrapper for local git repository operations
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    /// Open the git repository in the current directory
    pub fn open_current_dir() -> Result<Self> {
        Self::discover(".")
    }

    /// Discover a git repository from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| GhApiError::NotGitRepository)?;
        Ok(Self {
            path: repo.path().to_path_buf(),
        })
    }

    /// Create a new bare repository at `path`
    pub fn init_bare<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::init_bare(path)?;
        Ok(Self {
            path: repo.path().to_path_buf(),
        })
    }

    /// Check if the current directory is a git repository
    pub fn is_git_repository() -> bool {
        Repository::discover(".").is_ok()
    }

    /// Path of the git directory (`.git` or the bare repository itself)
    pub fn git_dir(&self) -> &Path {
        &self.path
    }

    /// Configure a credential helper in the repository's local config
    ///
    /// Replaces any helper previously set at the local level.
    pub fn with_credential_helper(self, helper: &str) -> Result<Self> {
        let repo = Repository::open(&self.path)?;
        let mut local = repo.config()?.open_level(ConfigLevel::Local)?;
        local.set_str(HELPER_KEY, helper)?;
        Ok(self)
    }

    /// Credential helpers that apply to `host`, in the order git would try them
    pub fn credential_helpers(&self, host: &str) -> Result<Vec<String>> {
        let repo = Repository::open(&self.path)?;
        let config = repo.config()?;
        collect_helpers(&config, host)
    }
}

/// Credential helpers from the user's global/system config, for callers
/// running outside any repository
pub fn default_credential_helpers(host: &str) -> Result<Vec<String>> {
    let config = Config::open_default()?;
    collect_helpers(&config, host)
}

/// Read `credential.helper` followed by `credential.https://<host>.helper`
///
/// An empty value clears the helpers accumulated so far, matching git.
fn collect_helpers(config: &Config, host: &str) -> Result<Vec<String>> {
    let scoped_key = format!("credential.https://{}.helper", host);
    let mut helpers = Vec::new();

    for key in [HELPER_KEY, scoped_key.as_str()] {
        let entries = match config.multivar(key, None) {
            Ok(entries) => entries,
            Err(e) if e.code() == git2::ErrorCode::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        entries.for_each(|entry| match entry.value() {
            Some("") => helpers.clear(),
            Some(value) => helpers.push(value.to_string()),
            None => {}
        })?;
    }

    Ok(helpers)
}
