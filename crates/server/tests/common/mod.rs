//! Common test utilities for in-process API testing with a mock backend.
//!
//! The fixture builds the real router around a `MockConversionClient`, a
//! filesystem cache in a temporary directory and an in-memory audit store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use convertino_core::{
    auth::ApiKeyAuthenticator, create_audit_system, load_config_from_str, AuditSink, AuditStore,
    Authenticator, ConversionOrchestrator, FsContentCache, NoneAuthenticator, SqliteAuditStore,
};

pub use convertino_core::testing::{fixtures, MockConversionClient};
use convertino_server::files::FilesRoot;

/// Key accepted when the fixture is built with API key auth.
pub const TEST_API_KEY: &str = "test-api-key";

pub struct TestFixture {
    pub router: Router,
    pub client: Arc<MockConversionClient>,
    pub audit_store: Arc<dyn AuditStore>,
    /// Holds the files root, the cache and anything placed outside the root.
    pub temp_dir: TempDir,
    files_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Require `TEST_API_KEY` on protected routes.
    pub api_key_auth: bool,
    /// `backend_alert_credit_limit`
    pub alert_credit_limit: u32,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = load_config_from_str(&format!(
            r#"
backend_alert_credit_limit = {}

[auth]
method = "none"

[cloudconvert]
api_key = "fixture-key"

[server]
files_root = "{}"

[cache]
dir = "{}"
"#,
            test_config.alert_credit_limit,
            temp_dir.path().join("files").display(),
            temp_dir.path().join("cache").display(),
        ))
        .expect("Failed to parse fixture config");

        let authenticator: Arc<dyn Authenticator> = if test_config.api_key_auth {
            Arc::new(ApiKeyAuthenticator::new(TEST_API_KEY))
        } else {
            Arc::new(NoneAuthenticator::new())
        };

        let audit_store: Arc<dyn AuditStore> =
            Arc::new(SqliteAuditStore::in_memory().expect("Failed to create audit store"));
        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let client = Arc::new(MockConversionClient::new());
        let orchestrator = ConversionOrchestrator::new(
            client.clone(),
            Arc::new(FsContentCache::from_config(&config.cache)),
        )
        .with_audit(Arc::new(audit_handle) as Arc<dyn AuditSink>);

        let files_root = FilesRoot::create(&config.server.files_root)
            .await
            .expect("Failed to create files root");
        let files_dir = files_root.path().to_path_buf();

        let state = Arc::new(convertino_server::state::AppState::new(
            config,
            authenticator,
            Arc::clone(&audit_store),
            Arc::new(orchestrator),
            files_root,
        ));

        Self {
            router: convertino_server::api::create_router(state),
            client,
            audit_store,
            temp_dir,
            files_dir,
        }
    }

    /// Canonical files root the API is confined to.
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// Write a source document into the files root.
    pub fn source(&self, name: &str) -> PathBuf {
        fixtures::source_file(&self.files_dir, name)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    pub async fn get_with_key(&self, path: &str, key: &str) -> TestResponse {
        self.request("GET", path, None, Some(key)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    pub async fn post_with_key(&self, path: &str, body: Value, key: &str) -> TestResponse {
        self.request("POST", path, Some(body), Some(key)).await
    }

    /// Wait until the audit writer has persisted `count` events of `event_type`.
    pub async fn wait_for_audit(&self, event_type: &str, count: i64) -> bool {
        let filter = convertino_core::AuditFilter::new().with_event_type(event_type);
        for _ in 0..50 {
            if self.audit_store.count(&filter).unwrap_or(0) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        api_key: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(key) = api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
