//! Common test utilities for API tests with a mock fetcher.
//!
//! This module provides a test fixture that builds the router in-process
//! with a scripted mock fetcher injected, enabling end-to-end testing of
//! the HTTP surface without the real external tool installed.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tubedrop_core::testing::MockFetcher;
use tubedrop_core::{
    Config, DownloadOrchestrator, DownloadsConfig, FileDelivery, JobRegistry, SourceFetcher,
};
use tubedrop_server::api::create_router;
use tubedrop_server::state::AppState;

/// Test fixture holding an in-process router over mock dependencies.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - script per-job outcomes
    pub fetcher: Arc<MockFetcher>,
    /// The job registry behind the router
    pub registry: Arc<JobRegistry>,
    /// Temporary downloads directory
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw_body: Vec<u8>,
}

impl TestFixture {
    /// Create a fixture around the given mock fetcher.
    pub fn new(fetcher: MockFetcher) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let downloads = DownloadsConfig {
            dir: temp_dir.path().to_path_buf(),
        };

        let mut config = Config::default();
        config.downloads = downloads.clone();

        let registry = Arc::new(JobRegistry::new());
        let fetcher = Arc::new(fetcher);
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            downloads,
            Arc::clone(&registry),
            Arc::clone(&fetcher) as Arc<dyn SourceFetcher>,
        ));
        let delivery = Arc::new(FileDelivery::new(Arc::clone(&registry)));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&registry),
            orchestrator,
            delivery,
        ));
        let router = create_router(state);

        Self {
            router,
            fetcher,
            registry,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Poll `/progress/{id}` until the predicate holds or attempts run out.
    pub async fn wait_for_progress<F>(&self, id: &str, predicate: F) -> Value
    where
        F: Fn(&Value) -> bool,
    {
        for _ in 0..200 {
            let response = self.get(&format!("/progress/{}", id)).await;
            if response.status == StatusCode::OK && predicate(&response.body) {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("progress for job {} never matched the predicate", id);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            raw_body: body_bytes.to_vec(),
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
