//! Credential resolution through git credential helpers
//!
//! Credentials are never stored by this crate. Every lookup runs the helpers
//! configured in git (`credential.helper`) using git's helper protocol:
//!
//! ```text
//! stdin:  protocol=https\nhost=<host>\n\n
//! stdout: username=<user>\npassword=<secret>\n
//! ```
//!
//! A helper that answers without a username/password pair means "no
//! credential" and the caller proceeds anonymously. A helper that cannot be
//! started, exits non-zero, times out or prints garbage is a backend error.

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::core::git::{self, GitRepository};
use crate::error::{GhApiError, Result};

/// Default time a helper may take before it is killed
pub const DEFAULT_HELPER_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between exit-status polls while waiting on a helper
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A username/secret pair scoped to one host
///
/// Lives only for the request that needed it.
#[derive(Clone)]
pub struct Credential {
    /// Host the credential was resolved for
    pub host: String,
    /// Account name
    pub username: String,
    /// Password or token
    pub secret: SecretString,
}

impl Credential {
    pub fn new(host: &str, username: &str, secret: &str) -> Self {
        Self {
            host: host.to_string(),
            username: username.to_string(),
            secret: SecretString::from(secret.to_string()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Source of host-scoped credentials
///
/// `Ok(None)` means no credential exists and the request goes out anonymous.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    fn resolve(&self, host: &str) -> Result<Option<Credential>>;
}

/// Credential store backed by the git credential helpers
///
/// Holds only the repository location and a timeout; helper configuration
/// and credentials are re-read on every call.
#[derive(Debug, Clone)]
pub struct GitCredentialStore {
    repo_dir: Option<PathBuf>,
    timeout: Duration,
}

impl GitCredentialStore {
    /// Use helpers configured for `repo` (local, global and system levels)
    pub fn new(repo: &GitRepository) -> Self {
        Self {
            repo_dir: Some(repo.git_dir().to_path_buf()),
            timeout: DEFAULT_HELPER_TIMEOUT,
        }
    }

    /// Use only the user's global/system helpers
    pub fn global() -> Self {
        Self {
            repo_dir: None,
            timeout: DEFAULT_HELPER_TIMEOUT,
        }
    }

    /// Bound each helper invocation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn helpers(&self, host: &str) -> Result<Vec<String>> {
        match &self.repo_dir {
            Some(dir) => GitRepository::discover(dir)?.credential_helpers(host),
            None => git::default_credential_helpers(host),
        }
    }
}

impl CredentialSource for GitCredentialStore {
    fn resolve(&self, host: &str) -> Result<Option<Credential>> {
        let helpers = self.helpers(host)?;
        if helpers.is_empty() {
            debug!(host, "no credential helper configured");
            return Ok(None);
        }

        for helper in &helpers {
            let stdout = run_helper(helper, host, self.repo_dir.as_deref(), self.timeout)?;
            match parse_helper_output(&stdout)? {
                HelperAnswer::Found { username, password } => {
                    debug!(host, helper = %helper, username = %username, "credential resolved");
                    return Ok(Some(Credential {
                        host: host.to_string(),
                        username,
                        secret: SecretString::from(password),
                    }));
                }
                HelperAnswer::Quit => {
                    debug!(host, helper = %helper, "credential helper asked to stop");
                    return Ok(None);
                }
                HelperAnswer::Missing => {
                    debug!(host, helper = %helper, "credential helper has no match");
                }
            }
        }

        Ok(None)
    }
}

/// What a helper said about a host
#[derive(Debug, PartialEq, Eq)]
enum HelperAnswer {
    Found { username: String, password: String },
    Missing,
    Quit,
}

/// Parse `key=value` lines from a helper
///
/// Unknown keys are ignored. A non-blank line without `=` is garbled output.
/// A lone username or lone password counts as no match.
fn parse_helper_output(output: &[u8]) -> Result<HelperAnswer> {
    let text = std::str::from_utf8(output).map_err(|_| {
        GhApiError::CredentialBackend("helper output is not valid UTF-8".to_string())
    })?;

    let mut username = None;
    let mut password = None;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }

        // Never echo the line itself: it may hold the secret
        let (key, value) = line.split_once('=').ok_or_else(|| {
            GhApiError::CredentialBackend(format!(
                "unparsable helper output on line {}",
                index + 1
            ))
        })?;

        match key {
            "username" => username = Some(value.to_string()),
            "password" => password = Some(value.to_string()),
            "quit" if value == "1" || value.eq_ignore_ascii_case("true") => {
                return Ok(HelperAnswer::Quit)
            }
            _ => {}
        }
    }

    match (username, password) {
        (Some(username), Some(password)) => Ok(HelperAnswer::Found { username, password }),
        _ => Ok(HelperAnswer::Missing),
    }
}

/// Shell command line for a helper, following git's rules
fn helper_command_line(helper: &str) -> String {
    if let Some(shell) = helper.strip_prefix('!') {
        return format!("{} get", shell);
    }

    let program = helper.split_whitespace().next().unwrap_or_default();
    if Path::new(program).is_absolute() {
        format!("{} get", helper)
    } else {
        format!("git credential-{} get", helper)
    }
}

/// Run one helper and return its stdout
fn run_helper(
    helper: &str,
    host: &str,
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(helper_command_line(helper))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| {
        GhApiError::CredentialBackend(format!("cannot start helper '{}': {}", helper, e))
    })?;

    let request = format!("protocol=https\nhost={}\n\n", host);
    if let Some(mut stdin) = child.stdin.take() {
        // Helpers that never read their input close the pipe early
        match stdin.write_all(request.as_bytes()) {
            Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(GhApiError::CredentialBackend(format!(
                    "cannot write to helper '{}': {}",
                    helper, e
                )));
            }
            _ => {}
        }
    }

    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::channel();
    spawn_reader(Pipe::Stdout, child.stdout.take(), tx.clone());
    spawn_reader(Pipe::Stderr, child.stderr.take(), tx);

    let status = wait_until(&mut child, deadline, timeout).map_err(|e| {
        GhApiError::CredentialBackend(format!("helper '{}' {}", helper, e))
    })?;

    // A background process may still hold the pipes after the helper exits
    let (stdout, stderr) = collect_output(&rx, deadline, timeout).map_err(|e| {
        GhApiError::CredentialBackend(format!("helper '{}' {}", helper, e))
    })?;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        return Err(GhApiError::CredentialBackend(format!(
            "helper '{}' exited with {}{}",
            helper,
            status,
            if stderr.is_empty() {
                String::new()
            } else {
                format!(": {}", stderr)
            }
        )));
    }

    Ok(stdout)
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Pipe,
    source: Option<R>,
    tx: Sender<(Pipe, Vec<u8>)>,
) {
    if let Some(mut source) = source {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = source.read_to_end(&mut buf);
            let _ = tx.send((pipe, buf));
        });
    }
}

/// Gather both pipes, giving up at `deadline`
fn collect_output(
    rx: &Receiver<(Pipe, Vec<u8>)>,
    deadline: Instant,
    timeout: Duration,
) -> std::result::Result<(Vec<u8>, Vec<u8>), String> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Pipe::Stdout, buf)) => stdout = buf,
            Ok((Pipe::Stderr, buf)) => stderr = buf,
            Err(RecvTimeoutError::Disconnected) => return Ok((stdout, stderr)),
            Err(RecvTimeoutError::Timeout) => {
                return Err(format!("timed out after {:?} waiting for output", timeout))
            }
        }
    }
}

/// Wait for the child, killing it once `deadline` has passed
fn wait_until(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
) -> std::result::Result<std::process::ExitStatus, String> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {:?}", timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(format!("could not be awaited: {}", e)),
        }
    }
}

/// Get a masked version of a secret for display (shows first 4 and last 4 chars)
pub fn mask_secret(secret: &SecretString) -> String {
    let exposed = secret.expose_secret();
    let chars: Vec<char> = exposed.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}
