//! Credential-backed GitHub API client
//!
//! Every call resolves the credential for the API host, builds a fresh
//! request and sends it once. Nothing is carried over between calls: a
//! rotated secret is picked up on the next request, and a removed one turns
//! the next request anonymous.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::core::config::{Config, DEFAULT_API_URL};
use crate::core::credentials::{CredentialSource, GitCredentialStore};
use crate::core::git::GitRepository;
use crate::error::{GhApiError, Result};
use crate::github::request::{HttpMethod, RequestBuilder};
use crate::github::transport::{ReqwestTransport, Transport};

/// GitHub API client sourcing credentials from git credential helpers
pub struct GitHubApiTransport {
    credentials: Box<dyn CredentialSource>,
    transport: Box<dyn Transport>,
    builder: RequestBuilder,
    /// Opaque label handed through to callers
    storage_path: String,
}

impl GitHubApiTransport {
    /// Create a client for api.github.com using `repo`'s credential helpers
    pub fn new<T>(repo: &GitRepository, transport: T, storage_path: impl Into<String>) -> Self
    where
        T: Transport + 'static,
    {
        Self::with_credential_source(GitCredentialStore::new(repo), transport, storage_path)
    }

    /// Create a client for api.github.com with any credential source
    pub fn with_credential_source<C, T>(
        credentials: C,
        transport: T,
        storage_path: impl Into<String>,
    ) -> Self
    where
        C: CredentialSource + 'static,
        T: Transport + 'static,
    {
        Self {
            credentials: Box::new(credentials),
            transport: Box::new(transport),
            builder: default_builder(),
            storage_path: storage_path.into(),
        }
    }

    /// Build a network client from configuration
    ///
    /// Without a repository only global/system credential helpers apply.
    pub fn from_config(config: &Config, repo: Option<&GitRepository>) -> Result<Self> {
        let credentials = match repo {
            Some(repo) => GitCredentialStore::new(repo),
            None => GitCredentialStore::global(),
        }
        .with_timeout(config.credential_helper_timeout());

        let transport = ReqwestTransport::new(config.http_timeout(), &config.user_agent)?;
        let storage = config.repo_storage()?;

        Self::with_credential_source(credentials, transport, storage.display().to_string())
            .with_api_url(&config.api_url)
    }

    /// Resolve paths against `api_url` instead of api.github.com
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        self.builder = RequestBuilder::new(api_url)?;
        Ok(self)
    }

    pub fn api_url(&self) -> &str {
        self.builder.base_url()
    }

    /// Host whose credential is resolved for every call
    pub fn api_host(&self) -> &str {
        self.builder.host()
    }

    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    /// `GET <base><path>`, returning the raw response body
    pub fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.execute(HttpMethod::Get, path, None)
    }

    /// `POST <base><path>` with `body`, returning the raw response body
    pub fn post(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<Vec<u8>> {
        self.execute(HttpMethod::Post, path, Some(body.into()))
    }

    /// GET and decode the JSON response
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get(path)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST a JSON payload and decode the JSON response
    pub fn post_json<B, T>(&self, path: &str, payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload)?;
        let response = self.post(path, body)?;
        Ok(serde_json::from_slice(&response)?)
    }

    fn execute(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let credential = self.credentials.resolve(self.builder.host())?;
        let request = self.builder.build(method, path, body, credential.as_ref())?;
        debug!(
            method = %request.method,
            url = %request.url,
            authenticated = request.is_authenticated(),
            "sending GitHub API request"
        );

        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(GhApiError::Api {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}

fn default_builder() -> RequestBuilder {
    RequestBuilder::new(DEFAULT_API_URL).expect("default API URL is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::thread;

    use crate::core::credentials::{Credential, MockCredentialSource};
    use crate::github::request::{AUTHORIZATION, CONTENT_TYPE};
    use crate::github::testing::MockTransport;
    use crate::github::transport::TransportError;

    const BASE: &str = "https://api.example.com";

    fn anonymous() -> MockCredentialSource {
        let mut source = MockCredentialSource::new();
        source.expect_resolve().returning(|_| Ok(None));
        source
    }

    fn authenticated() -> MockCredentialSource {
        let mut source = MockCredentialSource::new();
        source
            .expect_resolve()
            .returning(|host| Ok(Some(Credential::new(host, "user", "SECRET"))));
        source
    }

    fn client(source: MockCredentialSource, mock: &Arc<MockTransport>) -> GitHubApiTransport {
        GitHubApiTransport::with_credential_source(source, Arc::clone(mock), "some_storage_file")
            .with_api_url(BASE)
            .unwrap()
    }

    #[test]
    fn test_get_returns_trained_body() {
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", br#"{"a":1}"#);

        let body = client(authenticated(), &mock).get("/x").unwrap();
        assert_eq!(body, br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn test_anonymous_get_has_no_authorization() {
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");

        client(anonymous(), &mock).get("/x").unwrap();

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].header(AUTHORIZATION).is_none());
        assert!(sent[0].body.is_none());
    }

    #[test]
    fn test_authenticated_get_has_basic_header() {
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");

        client(authenticated(), &mock).get("/x").unwrap();

        assert_eq!(
            mock.requests()[0].header(AUTHORIZATION),
            Some("Basic dXNlcjpTRUNSRVQ=")
        );
    }

    #[test]
    fn test_credential_resolved_for_api_host_once_per_call() {
        let mut source = MockCredentialSource::new();
        source
            .expect_resolve()
            .times(2)
            .returning(|host| {
                assert_eq!(host, "api.example.com");
                Ok(None)
            });
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");

        let api = client(source, &mock);
        api.get("/x").unwrap();
        api.get("/x").unwrap();
        assert_eq!(mock.requests().len(), 2);
    }

    #[test]
    fn test_credential_host_keeps_port() {
        let mut source = MockCredentialSource::new();
        source.expect_resolve().times(1).returning(|host| {
            assert_eq!(host, "ghe.example.com:8443");
            Ok(Some(Credential::new(host, "user", "SECRET")))
        });
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://ghe.example.com:8443/api/v3/user", b"{}");

        let api = GitHubApiTransport::with_credential_source(source, Arc::clone(&mock), "storage")
            .with_api_url("https://ghe.example.com:8443/api/v3")
            .unwrap();
        assert_eq!(api.api_host(), "ghe.example.com:8443");
        api.get("/user").unwrap();
        assert!(mock.requests()[0].is_authenticated());
    }

    #[test]
    fn test_authentication_follows_each_resolution() {
        let mut source = MockCredentialSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|host| Ok(Some(Credential::new(host, "user", "SECRET"))));
        source
            .expect_resolve()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");

        let api = client(source, &mock);
        api.get("/x").unwrap();
        api.get("/x").unwrap();

        let sent = mock.requests();
        assert!(sent[0].is_authenticated());
        assert!(!sent[1].is_authenticated());
    }

    #[test]
    fn test_post_sends_body_unmodified() {
        let mock = Arc::new(MockTransport::new());
        mock.train_with_validator(
            HttpMethod::Post,
            "https://api.example.com/repos/o/r/pulls",
            br#"{"number":12}"#,
            |body| body.contains("\"name\""),
        );

        let payload = br#"{"name":"feature", "draft":false}"#;
        let body = client(authenticated(), &mock)
            .post("/repos/o/r/pulls", payload.to_vec())
            .unwrap();

        assert_eq!(body, br#"{"number":12}"#.to_vec());
        let sent = mock.requests();
        assert_eq!(sent[0].body.as_deref(), Some(&payload[..]));
        assert_eq!(sent[0].header(CONTENT_TYPE), Some("application/json"));
    }

    #[test]
    #[should_panic(expected = "Request content did not match expected values")]
    fn test_post_rejected_by_validator_fails() {
        let mock = Arc::new(MockTransport::new());
        mock.train_with_validator(
            HttpMethod::Post,
            "https://api.example.com/repos",
            b"{}",
            |body| body.contains("\"name\""),
        );

        let _ = client(authenticated(), &mock).post("/repos", br#"{"title":"x"}"#.to_vec());
    }

    #[test]
    fn test_untrained_path_is_missing_expectation() {
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");

        let err = client(anonymous(), &mock).get("/unknown").unwrap_err();
        assert!(matches!(
            err,
            GhApiError::Transport(TransportError::MissingExpectation(_))
        ));
    }

    #[test]
    fn test_api_error_keeps_status_and_body() {
        let mock = Arc::new(MockTransport::new());
        let body =
            br#"{"message":"Bad credentials","documentation_url":"https://docs.github.com/rest"}"#;
        mock.train_status(HttpMethod::Get, "https://api.example.com/user", 401, body);

        let err = client(authenticated(), &mock).get("/user").unwrap_err();
        match &err {
            GhApiError::Api { status, body: got } => {
                assert_eq!(*status, 401);
                assert_eq!(got, &body.to_vec());
            }
            other => panic!("expected api error, got {:?}", other),
        }
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_backend_error_stops_the_call() {
        let mut source = MockCredentialSource::new();
        source
            .expect_resolve()
            .returning(|_| Err(GhApiError::CredentialBackend("helper crashed".to_string())));
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");

        let err = client(source, &mock).get("/x").unwrap_err();
        assert!(matches!(err, GhApiError::CredentialBackend(_)));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_json_helpers() {
        #[derive(serde::Serialize)]
        struct NewIssue<'a> {
            name: &'a str,
        }
        #[derive(serde::Deserialize)]
        struct Created {
            number: u64,
        }

        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", br#"{"number":3}"#);
        mock.train_with_validator(
            HttpMethod::Post,
            "https://api.example.com/issues",
            br#"{"number":4}"#,
            |body| body == r#"{"name":"bug"}"#,
        );

        let api = client(anonymous(), &mock);
        let got: Created = api.get_json("/x").unwrap();
        assert_eq!(got.number, 3);
        let created: Created = api.post_json("/issues", &NewIssue { name: "bug" }).unwrap();
        assert_eq!(created.number, 4);
    }

    #[test]
    fn test_default_api_url_and_storage_label() {
        let mock = Arc::new(MockTransport::new());
        let api =
            GitHubApiTransport::with_credential_source(anonymous(), mock, "some_storage_file");
        assert_eq!(api.api_url(), "https://api.github.com");
        assert_eq!(api.api_host(), "api.github.com");
        assert_eq!(api.storage_path(), "some_storage_file");
    }

    #[test]
    fn test_concurrent_calls_share_nothing() {
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/x", b"{}");
        let api = Arc::new(client(authenticated(), &mock));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let api = Arc::clone(&api);
                thread::spawn(move || api.get("/x").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), b"{}".to_vec());
        }
        assert_eq!(mock.requests().len(), 4);
    }

    #[test]
    fn test_get_without_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let credentials_file = dir.path().join("credentials");
        std::fs::write(&credentials_file, "username=user\npassword=SECRET\n").unwrap();
        let repo = GitRepository::init_bare(dir.path().join("test_repo"))
            .unwrap()
            .with_credential_helper(&format!(
                "!f() {{ if [ -f '{0}' ]; then cat '{0}'; fi; }}; f",
                credentials_file.display()
            ))
            .unwrap();

        let mock = Arc::new(MockTransport::new());
        mock.train(
            HttpMethod::Get,
            "https://api.example.com/repos/o/r/pulls/12",
            br#"{"number":12}"#,
        );
        let api = GitHubApiTransport::new(&repo, Arc::clone(&mock), "some_storage_file")
            .with_api_url(BASE)
            .unwrap();

        assert_eq!(
            api.get("/repos/o/r/pulls/12").unwrap(),
            br#"{"number":12}"#.to_vec()
        );

        std::fs::remove_file(&credentials_file).unwrap();
        assert_eq!(
            api.get("/repos/o/r/pulls/12").unwrap(),
            br#"{"number":12}"#.to_vec()
        );

        let sent = mock.requests();
        assert_eq!(sent[0].header(AUTHORIZATION), Some("Basic dXNlcjpTRUNSRVQ="));
        assert!(!sent[1].is_authenticated());
    }

    /// In-memory log sink
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_debug_logs_never_contain_secret() {
        let dir = tempfile::tempdir().unwrap();
        let repo = GitRepository::init_bare(dir.path())
            .unwrap()
            .with_credential_helper(
                "!f() { cat >/dev/null; printf 'username=user\\npassword=SECRET\\n'; }; f",
            )
            .unwrap();
        let mock = Arc::new(MockTransport::new());
        mock.train(HttpMethod::Get, "https://api.example.com/user", b"{}");
        let api = GitHubApiTransport::new(&repo, Arc::clone(&mock), "some_storage_file")
            .with_api_url(BASE)
            .unwrap();

        let logs = LogBuffer::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || api.get("/user").unwrap());

        assert!(mock.requests()[0].is_authenticated());
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("credential resolved"));
        assert!(output.contains("sending GitHub API request"));
        assert!(!output.contains("SECRET"));
        assert!(!output.contains("dXNlcjpTRUNSRVQ="));
    }
}
