//! Combine endpoints: synchronous and job-based.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use tracing::{info, warn};

use vmux_models::{CombineRequest, JobAccepted, JobId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::pipeline;
use crate::state::AppState;

/// `POST /combine-videos`
///
/// Runs the whole pipeline inside the request and streams the finished MP4
/// back as an attachment. The output file is deleted once its bytes are in
/// memory; nothing from a sync request survives the response.
pub async fn combine_videos(
    State(state): State<AppState>,
    Json(request): Json<CombineRequest>,
) -> ApiResult<Response> {
    request
        .validate_request()
        .map_err(ApiError::Validation)?;

    metrics::record_job_submitted("sync");

    // Only used to keep concurrent sync requests from colliding on disk.
    let file_id = JobId::new();
    let output_path = state
        .config
        .output_dir
        .join(format!("combined_video_{}.mp4", file_id));

    let result = pipeline::run(
        &state.fetcher,
        state.media.as_ref(),
        &state.config.work_dir,
        &request,
        &output_path,
    )
    .await;

    if let Err(e) = &result {
        metrics::record_job_failed("sync");
        warn!("Sync combine failed: {}", e);
    }
    result?;

    let bytes = tokio::fs::read(&output_path).await.map_err(|e| {
        ApiError::internal(format!("failed to read rendered output: {}", e))
    })?;

    if let Err(e) = tokio::fs::remove_file(&output_path).await {
        warn!(
            "Failed to remove sync output {}: {}",
            output_path.display(),
            e
        );
    }

    metrics::record_job_completed("sync");
    info!(size_kb = bytes.len() / 1024, "Sync combine complete");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"combined_video_{}.mp4\"", file_id),
        )
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("failed to build response: {}", e)))?;

    Ok(response)
}

/// `POST /combine-videos-async`
///
/// Registers a job, spawns a detached worker, and returns immediately with
/// the job id. Progress is observed through `GET /download/{job_id}`.
pub async fn combine_videos_async(
    State(state): State<AppState>,
    Json(request): Json<CombineRequest>,
) -> ApiResult<Json<JobAccepted>> {
    request
        .validate_request()
        .map_err(ApiError::Validation)?;

    metrics::record_job_submitted("async");

    let job = state.registry.create().await;
    let output_path = state.config.output_dir.join(format!("{}.mp4", job.id));

    // Acceptance reports Processing: the worker is spawned before the
    // response leaves, and clients should treat the job as already running.
    let accepted = state.registry.mark_processing(&job.id).await?;

    info!(job_id = %job.id, "Accepted async combine job");

    tokio::spawn(pipeline::run_job(
        job.id.clone(),
        state.registry.clone(),
        state.fetcher.clone(),
        state.media.clone(),
        state.config.work_dir.clone(),
        request,
        output_path.clone(),
    ));

    Ok(Json(JobAccepted {
        job_id: accepted.id,
        status: accepted.state,
        output_file: output_path.to_string_lossy().into_owned(),
    }))
}
