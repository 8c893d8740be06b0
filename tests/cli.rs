//! Command-line tests for the `ghapi` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `ghapi` with config and home directories isolated under `home`
fn ghapi(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ghapi").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_CACHE_HOME", home.path().join("cache"))
        .env_remove("GHAPI_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Bare repository whose helper list is reset to nothing
fn anonymous_repo(home: &TempDir) -> std::path::PathBuf {
    let dir = home.path().join("repo");
    gh_api_transport::core::GitRepository::init_bare(&dir)
        .unwrap()
        .with_credential_helper("")
        .unwrap();
    dir
}

#[test]
fn test_help_mentions_credential_helpers() {
    let home = TempDir::new().unwrap();
    ghapi(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("credential"));
}

#[test]
fn test_post_without_body_is_rejected() {
    let home = TempDir::new().unwrap();
    ghapi(&home)
        .args(["post", "/repos/o/r/issues"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--data"));
}

#[test]
fn test_config_roundtrip() {
    let home = TempDir::new().unwrap();

    ghapi(&home)
        .args(["config", "set", "http-timeout", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HTTP timeout set to: 7s"));

    ghapi(&home)
        .args(["config", "get", "http-timeout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("7s"));

    ghapi(&home)
        .args(["config", "remove", "http-timeout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30s"));
}

#[test]
fn test_config_rejects_bad_url() {
    let home = TempDir::new().unwrap();
    ghapi(&home)
        .args(["config", "set", "api-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid API URL"));
}

#[test]
fn test_hidden_storage_flag_overrides_config() {
    let home = TempDir::new().unwrap();
    ghapi(&home)
        .args(["--git-repo-storage", "/srv/repos", "config", "get", "repo-storage"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/srv/repos"));
}

#[test]
fn test_auth_status_without_credential() {
    let home = TempDir::new().unwrap();
    let repo = anonymous_repo(&home);
    ghapi(&home)
        .arg("--repo")
        .arg(&repo)
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api.github.com"))
        .stdout(predicate::str::contains("anonymously"));
}

#[test]
fn test_auth_status_masks_secret() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("repo");
    gh_api_transport::core::GitRepository::init_bare(&dir)
        .unwrap()
        .with_credential_helper(
            "!f() { cat >/dev/null; printf 'username=octocat\\npassword=ghp_1234567890abcdef\\n'; }; f",
        )
        .unwrap();

    ghapi(&home)
        .arg("--repo")
        .arg(&dir)
        .args(["auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("octocat"))
        .stdout(predicate::str::contains("ghp_...cdef"))
        .stdout(predicate::str::contains("1234567890").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_prints_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a":1}"#))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let repo = anonymous_repo(&home);
    let base = server.uri();

    tokio::task::spawn_blocking(move || {
        ghapi(&home)
            .arg("--repo")
            .arg(&repo)
            .args(["--api-url", &base, "get", "/x"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"{"a":1}"#));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_prints_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/private"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let repo = anonymous_repo(&home);
    let base = server.uri();

    tokio::task::spawn_blocking(move || {
        ghapi(&home)
            .arg("--repo")
            .arg(&repo)
            .args(["--api-url", &base, "get", "/repos/o/private"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("HTTP 404: Not Found"))
            .stderr(predicate::str::contains("Resource not found"));
    })
    .await
    .unwrap();
}
