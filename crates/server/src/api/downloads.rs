//! Download job API handlers.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tubedrop_core::{DeliveryError, DownloadRequest, JobError, OrchestratorError, OutputFormat};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a download.
///
/// Fields are optional so a missing value yields a 400 from the handler
/// instead of an unprocessable-entity rejection from the JSON extractor.
#[derive(Debug, Deserialize)]
pub struct CreateDownloadBody {
    pub url: Option<String>,
    pub format: Option<String>,
}

/// Response for a created download job
#[derive(Debug, Serialize)]
pub struct CreateDownloadResponse {
    pub id: String,
}

/// Response for a progress poll
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: f32,
    pub error: bool,
}

/// Response for a cancelled job
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub id: String,
    pub cancelled: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse { error: msg.into() }),
    )
}

fn not_found(msg: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse { error: msg.into() }),
    )
}

fn internal_error(msg: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse { error: msg.into() }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a new download job.
///
/// Returns the job id immediately; any asynchronous failure is reported
/// through the progress endpoint, never here.
pub async fn create_download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateDownloadBody>,
) -> Result<Json<CreateDownloadResponse>, (StatusCode, Json<ApiErrorResponse>)> {
    let Some(url) = body.url else {
        return Err(bad_request("missing field: url"));
    };
    let Some(format) = body.format else {
        return Err(bad_request("missing field: format"));
    };
    let format: OutputFormat = format
        .parse()
        .map_err(|e: tubedrop_core::job::UnknownFormatError| bad_request(e.to_string()))?;

    match state
        .orchestrator()
        .submit(DownloadRequest { url, format })
        .await
    {
        Ok(id) => Ok(Json(CreateDownloadResponse { id })),
        Err(OrchestratorError::InvalidRequest(msg)) => Err(bad_request(msg)),
        Err(e) => Err(internal_error(e.to_string())),
    }
}

/// Poll the progress of a job.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, (StatusCode, Json<ApiErrorResponse>)> {
    match state.registry().get(&id).await {
        Some(job) => Ok(Json(ProgressResponse {
            progress: job.progress,
            error: job.state.is_failed(),
        })),
        None => Err(not_found(format!("Job not found: {}", id))),
    }
}

/// Stream a completed job's artifact and retire the job.
///
/// The artifact is served at most once: the claim removes the registry
/// entry, and the file is deleted when the response stream is dropped.
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, Json<ApiErrorResponse>)> {
    let artifact = match state.delivery().claim(&id).await {
        Ok(artifact) => artifact,
        Err(
            e @ (DeliveryError::NotFound(_)
            | DeliveryError::NotReady { .. }
            | DeliveryError::MissingArtifact(_)),
        ) => return Err(not_found(e.to_string())),
        Err(e) => return Err(internal_error(e.to_string())),
    };

    let file_name = artifact.file_name.clone();
    let content_type = artifact.content_type;
    let size_bytes = artifact.size_bytes;

    let stream = artifact
        .into_stream()
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| internal_error(e.to_string()))
}

/// Cancel an active job (DELETE endpoint).
pub async fn cancel_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, (StatusCode, Json<ApiErrorResponse>)> {
    match state.orchestrator().cancel(&id).await {
        Ok(()) => Ok(Json(CancelResponse {
            id,
            cancelled: true,
        })),
        Err(OrchestratorError::Job(JobError::NotFound(_))) => {
            Err(not_found(format!("Job not found: {}", id)))
        }
        Err(OrchestratorError::Job(JobError::Terminal { state, .. })) => Err((
            StatusCode::CONFLICT,
            Json(ApiErrorResponse {
                error: format!("Cannot cancel job {}: already {}", id, state),
            }),
        )),
        Err(e) => Err(internal_error(e.to_string())),
    }
}
