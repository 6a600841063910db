//! End-to-end tests of the download API over an in-process router.

mod common;

use axum::http::{header, StatusCode};
use serde_json::json;
use std::time::Duration;

use common::TestFixture;
use tubedrop_core::testing::{MockBehavior, MockFetcher};

fn succeed_fixture(payload: &[u8]) -> TestFixture {
    TestFixture::new(MockFetcher::new(MockBehavior::Succeed {
        progress: vec![12.5, 48.0, 97.1],
        payload: payload.to_vec(),
    }))
}

// ============================================================================
// Request validation
// ============================================================================

#[tokio::test]
async fn create_download_returns_id() {
    let fixture = succeed_fixture(b"payload");

    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp3"}),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    let id = response.body["id"].as_str().expect("id in response");
    assert!(!id.is_empty());
}

#[tokio::test]
async fn create_download_ids_are_unique() {
    let fixture = succeed_fixture(b"payload");

    let first = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp3"}),
        )
        .await;
    let second = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp3"}),
        )
        .await;

    assert_ne!(first.body["id"], second.body["id"]);
}

#[tokio::test]
async fn missing_url_is_bad_request() {
    let fixture = succeed_fixture(b"payload");

    let response = fixture.post("/download", json!({"format": "mp3"})).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("url"));
}

#[tokio::test]
async fn missing_format_is_bad_request() {
    let fixture = succeed_fixture(b"payload");

    let response = fixture
        .post("/download", json!({"url": "https://example.com/a"}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("format"));
}

#[tokio::test]
async fn unsupported_format_is_bad_request() {
    let fixture = succeed_fixture(b"payload");

    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "flac"}),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schemeless_url_is_bad_request() {
    let fixture = succeed_fixture(b"payload");

    let response = fixture
        .post("/download", json!({"url": "example.com/a", "format": "mp4"}))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Unknown ids
// ============================================================================

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let fixture = succeed_fixture(b"payload");

    let response = fixture.get("/progress/no-such-job").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.get("/downloaded/no-such-job").await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.delete("/download/no-such-job").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// ============================================================================
// Lifecycle scenarios
// ============================================================================

#[tokio::test]
async fn full_lifecycle_download_poll_fetch_once() {
    let payload = b"transcoded media bytes";
    let fixture = succeed_fixture(payload);

    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp3"}),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    let id = response.body["id"].as_str().unwrap().to_string();

    // Poll until the job reports done and clean.
    let progress = fixture
        .wait_for_progress(&id, |body| body["progress"] == 100.0)
        .await;
    assert_eq!(progress["error"], false);

    // First fetch streams the artifact with attachment headers.
    let response = fixture.get(&format!("/downloaded/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.raw_body, payload);

    let disposition = response
        .headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("content-disposition present");
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&id));

    let content_type = response
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(content_type, "audio/mpeg");

    // The artifact is consumed: repeat fetch is 404 and the file is gone.
    let response = fixture.get(&format!("/downloaded/{}", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(!fixture.temp_dir.path().join(format!("{}.mp3", id)).exists());

    // The registry entry was retired with the artifact.
    let response = fixture.get(&format!("/progress/{}", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_job_reports_error_and_artifact_stays_unavailable() {
    let fixture = TestFixture::new(MockFetcher::new(MockBehavior::FailProcess {
        progress: vec![33.0],
        exit_code: 1,
    }));

    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp4"}),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    let id = response.body["id"].as_str().unwrap().to_string();

    let progress = fixture
        .wait_for_progress(&id, |body| body["error"] == true)
        .await;
    // Progress holds the last value seen before the failure.
    assert_eq!(progress["progress"], 33.0);

    let response = fixture.get(&format!("/downloaded/{}", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn spawn_failure_is_only_visible_via_progress() {
    let fixture = TestFixture::new(MockFetcher::new(MockBehavior::FailSpawn));

    // Creation still succeeds with an id.
    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp3"}),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    let id = response.body["id"].as_str().unwrap().to_string();

    let progress = fixture
        .wait_for_progress(&id, |body| body["error"] == true)
        .await;
    assert_eq!(progress["progress"], 0.0);
}

#[tokio::test]
async fn progress_never_regresses_while_polling() {
    let fetcher = MockFetcher::new(MockBehavior::Succeed {
        // The tool re-emits low values when it starts merging streams;
        // polled progress must not move backwards.
        progress: vec![30.0, 80.0, 10.0, 95.0],
        payload: b"payload".to_vec(),
    });
    let fixture = TestFixture::new(fetcher);
    fixture.fetcher.set_step_delay(Duration::from_millis(20)).await;

    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp3"}),
        )
        .await;
    let id = response.body["id"].as_str().unwrap().to_string();

    let mut observed = Vec::new();
    loop {
        let response = fixture.get(&format!("/progress/{}", id)).await;
        if response.status != StatusCode::OK {
            break;
        }
        let progress = response.body["progress"].as_f64().unwrap();
        observed.push(progress);
        if progress >= 100.0 || response.body["error"] == true {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(observed.windows(2).all(|w| w[0] <= w[1]),
        "observed a progress regression: {:?}", observed);
    assert_eq!(observed.last().copied(), Some(100.0));
}

#[tokio::test]
async fn jobs_complete_independently() {
    let fixture = succeed_fixture(b"good bytes");
    fixture
        .fetcher
        .set_behavior_for(
            "bad.example",
            MockBehavior::FailProcess {
                progress: vec![],
                exit_code: 2,
            },
        )
        .await;

    let good = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/good", "format": "mp3"}),
        )
        .await;
    let bad = fixture
        .post(
            "/download",
            json!({"url": "https://bad.example/clip", "format": "mp3"}),
        )
        .await;

    let good_id = good.body["id"].as_str().unwrap().to_string();
    let bad_id = bad.body["id"].as_str().unwrap().to_string();

    fixture
        .wait_for_progress(&good_id, |body| body["progress"] == 100.0)
        .await;
    fixture
        .wait_for_progress(&bad_id, |body| body["error"] == true)
        .await;

    // The failed neighbor does not affect the completed job's artifact.
    let response = fixture.get(&format!("/downloaded/{}", good_id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.raw_body, b"good bytes");

    let response = fixture.get(&format!("/downloaded/{}", bad_id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_active_job() {
    let fixture = TestFixture::new(MockFetcher::new(MockBehavior::HangUntilCancelled));

    let response = fixture
        .post(
            "/download",
            json!({"url": "https://example.com/a", "format": "mp4"}),
        )
        .await;
    let id = response.body["id"].as_str().unwrap().to_string();

    // Wait until the supervisor reports the tool running.
    fixture
        .wait_for_progress(&id, |_| true)
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = fixture.delete(&format!("/download/{}", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["cancelled"], true);

    fixture
        .wait_for_progress(&id, |body| body["error"] == true)
        .await;

    // Cancelling a terminal job conflicts.
    let response = fixture.delete(&format!("/download/{}", id)).await;
    assert_status!(response, StatusCode::CONFLICT);
}

// ============================================================================
// Ambient surface
// ============================================================================

#[tokio::test]
async fn health_endpoint() {
    let fixture = succeed_fixture(b"payload");
    let response = fixture.get("/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn config_endpoint_reports_downloads_dir() {
    let fixture = succeed_fixture(b"payload");
    let response = fixture.get("/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(
        response.body["downloads"]["dir"],
        fixture.temp_dir.path().to_string_lossy().as_ref()
    );
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let fixture = succeed_fixture(b"payload");
    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.raw_body).unwrap();
    assert!(text.contains("tubedrop_jobs_submitted_total"));
}
