//! Test application setup utilities
//!
//! Builds the full router (gate, API, fallbacks) over a temporary SQLite
//! database, in-process fakes for the credential store and summarizer, and
//! a wiremock server standing in for the GitHub API.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

use shke_portal::{
    config::{
        AppConfig, AuthConfig, DatabaseConfig, GithubConfig, LlmConfig, LoggingConfig,
        ServerConfig, SupabaseConfig,
    },
    create_router, db,
    middleware::session::issue_session_token,
    services::{GithubClient, Summarizer},
    AppState,
};

use super::mocks::{FakeCredentialStore, FakeSummarizer};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Stand-in for `api.github.com`
    pub github: MockServer,
    pub credentials: Arc<FakeCredentialStore>,
    pub summarizer: Arc<FakeSummarizer>,
}

impl TestApp {
    /// Test application whose summarizer always succeeds
    pub async fn new() -> Self {
        Self::build(test_config(), Arc::new(FakeSummarizer::succeeding()), None).await
    }

    /// Test application with a custom fake summarizer
    pub async fn with_fake_summarizer(summarizer: FakeSummarizer) -> Self {
        Self::build(test_config(), Arc::new(summarizer), None).await
    }

    /// Test application wired to a real summarizer implementation
    pub async fn with_summarizer(summarizer: Arc<dyn Summarizer>) -> Self {
        Self::build(
            test_config(),
            Arc::new(FakeSummarizer::succeeding()),
            Some(summarizer),
        )
        .await
    }

    /// Test application that serves a frontend from `static_dir`
    pub async fn with_static_dir(static_dir: PathBuf) -> Self {
        let mut config = test_config();
        config.server.static_dir = Some(static_dir);
        Self::build(config, Arc::new(FakeSummarizer::succeeding()), None).await
    }

    async fn build(
        mut config: AppConfig,
        fake_summarizer: Arc<FakeSummarizer>,
        summarizer_override: Option<Arc<dyn Summarizer>>,
    ) -> Self {
        let github = MockServer::start().await;
        config.github.api_url = github.uri();

        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let credentials = Arc::new(FakeCredentialStore::new());
        let github_client =
            Arc::new(GithubClient::new(&config.github).expect("Failed to build GitHub client"));
        let summarizer: Arc<dyn Summarizer> =
            summarizer_override.unwrap_or_else(|| fake_summarizer.clone() as Arc<dyn Summarizer>);

        let state = AppState {
            config,
            db,
            credentials: credentials.clone(),
            github: github_client,
            summarizer,
        };

        let router = create_router(state.clone());

        Self {
            router,
            state,
            github,
            credentials,
            summarizer: fake_summarizer,
        }
    }

    /// `Cookie` header value carrying a valid session for `user_id`
    pub fn session_cookie(&self, user_id: Uuid) -> String {
        let auth = &self.state.config.auth;
        let token = issue_session_token(user_id, &auth.jwt_secret, auth.session_ttl_hours)
            .expect("Failed to issue test session token");
        format!("{}={}", auth.cookie_name, token)
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a GET request carrying a raw `Cookie` header
    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send_json("POST", uri, body, &[]).await
    }

    /// Make a JSON request with extra headers
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.send_raw(method, uri, body.to_string(), headers).await
    }

    /// Make a request with an arbitrary (possibly malformed) body
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        body: String,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::from(body)).unwrap()).await
    }

    /// Make a JSON request as the signed-in `user_id`
    pub async fn send_json_as(
        &self,
        user_id: Uuid,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        let cookie = self.session_cookie(user_id);
        self.send_json(method, uri, body, &[("cookie", cookie.as_str())])
            .await
    }

    /// Make a bodyless request as the signed-in `user_id`
    pub async fn send_as(&self, user_id: Uuid, method: &str, uri: &str) -> TestResponse {
        let cookie = self.session_cookie(user_id);
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Redirect target, if any
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// All `Set-Cookie` header values
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    /// Assert a 307 redirect to `target`
    pub fn assert_redirect(&self, target: &str) -> &Self {
        self.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(self.location(), Some(target));
        self
    }
}

/// Create a test configuration with temporary SQLite database
pub fn test_config() -> AppConfig {
    // Use a unique temp file for each test to avoid conflicts
    let db_path = std::env::temp_dir().join(format!(
        "shke_test_{}.db",
        Uuid::new_v4().to_string().replace('-', "")
    ));

    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
        },
        auth: AuthConfig {
            jwt_secret: "test_secret_key_that_is_at_least_32_bytes_long".to_string(),
            session_ttl_hours: 24,
            cookie_name: "jwt".to_string(),
            secure_cookies: false,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 1,
            connect_timeout_secs: 30,
        },
        logging: LoggingConfig::default(),
        supabase: SupabaseConfig {
            url: "http://127.0.0.1:9".to_string(),
            anon_key: "test-anon-key".to_string(),
            timeout_secs: 5,
        },
        github: GithubConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            token: None,
            timeout_secs: 5,
        },
        llm: LlmConfig {
            api_key: "sk-test".to_string(),
            timeout_secs: 5,
            ..LlmConfig::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = TestApp::new().await;
        let response = app.get("/api/health").await;
        response.assert_ok();
    }
}
