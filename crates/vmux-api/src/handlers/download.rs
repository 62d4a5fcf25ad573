//! Job status and result retrieval.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use vmux_jobs::RegistryError;
use vmux_models::{JobId, JobState, JobStatusBody};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /download/{job_id}`
///
/// Done jobs stream their output file. Pending and Processing jobs answer
/// 202 with a status body so clients can poll the same URL. Failed jobs
/// answer 500 carrying the recorded error.
pub async fn download_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let id = JobId::from_string(job_id);
    let job = state.registry.get(&id).await.map_err(|e| match e {
        RegistryError::NotFound(id) => ApiError::not_found(format!("No job with id {}", id)),
        other => ApiError::from(other),
    })?;

    match job.state {
        JobState::Done => {
            let output_path = job.output_path.ok_or_else(|| {
                ApiError::internal(format!("job {} is done but has no output path", id))
            })?;

            let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
                warn!(
                    job_id = %id,
                    "Output file {} unreadable: {}",
                    output_path.display(),
                    e
                );
                ApiError::internal("job output is no longer available")
            })?;

            let response = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "video/mp4")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"combined_video_{}.mp4\"", id),
                )
                .body(Body::from(bytes))
                .map_err(|e| ApiError::internal(format!("failed to build response: {}", e)))?;
            Ok(response)
        }
        JobState::Pending | JobState::Processing => {
            let body = JobStatusBody {
                job_id: id,
                status: job.state,
                detail: None,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        JobState::Failed => {
            let body = JobStatusBody {
                job_id: id,
                status: job.state,
                detail: job.error_message,
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}
