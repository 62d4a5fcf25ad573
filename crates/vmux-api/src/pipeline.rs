//! The combine pipeline: fetch sources, plan the fit, render, mux.
//!
//! Both endpoints run the same steps; the async variant wraps them in
//! [`run_job`], which owns the registry transitions for a detached worker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use vmux_jobs::JobRegistry;
use vmux_media::{extension_from_url, move_file, Fetcher, JobScratch, MediaError, MediaOps};
use vmux_models::{CombineRequest, JobId, Plan, PlanError};

use crate::error::ApiError;
use crate::metrics;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            // A plan error means the downloaded sources cannot satisfy the
            // request (e.g. a zero-length clip), so the caller gets a 400.
            PipelineError::Plan(e) => ApiError::Validation(e.to_string()),
            PipelineError::Media(e) => ApiError::Media(e),
        }
    }
}

/// Execute the full combine pipeline for one request.
///
/// Downloads the audio track and every video link into job-scoped scratch
/// space, probes clip durations, fits them to the target duration, renders
/// the concatenation, muxes the audio, and moves the result to
/// `output_path`. Scratch space is removed on every exit path.
pub async fn run(
    fetcher: &Fetcher,
    media: &dyn MediaOps,
    work_dir: &Path,
    request: &CombineRequest,
    output_path: &Path,
) -> Result<(), PipelineError> {
    let scratch = JobScratch::new_in(work_dir)?;
    let target = request.target_duration();

    info!(
        clips = request.video_links.len(),
        target_secs = target,
        "Starting combine pipeline"
    );

    // Audio first: if the track is unreachable there is no point paying for
    // the (much larger) video downloads.
    let audio_ext = extension_from_url(&request.audio_link, "mp3");
    let audio_path = scratch.audio_path(&audio_ext);
    fetcher.fetch_to(&request.audio_link, &audio_path).await?;

    let mut clip_paths = Vec::with_capacity(request.video_links.len());
    for (index, link) in request.video_links.iter().enumerate() {
        let ext = extension_from_url(link, "mp4");
        let clip = scratch.clip_path(index, &ext);
        fetcher.fetch_to(link, &clip).await?;
        clip_paths.push(clip);
    }

    let mut durations = Vec::with_capacity(clip_paths.len());
    for clip in &clip_paths {
        durations.push(media.probe_duration(clip).await?);
    }

    let plan = Plan::fit(&durations, target)?;
    info!(
        segments = plan.len(),
        planned_secs = plan.total_length(),
        "Fit plan computed"
    );

    let concat_output = scratch.concat_output_path();
    media.concatenate(&clip_paths, &plan, &concat_output).await?;

    let mux_output = scratch.mux_output_path();
    media
        .mux_audio(&concat_output, &audio_path, target, &mux_output)
        .await?;

    move_file(&mux_output, output_path).await?;

    info!(output = %output_path.display(), "Combine pipeline finished");
    Ok(())
}

/// Run the pipeline for a detached background job.
///
/// The handler has already moved the job to Processing; this worker owns
/// the terminal transition. Errors never escape silently; a failed registry
/// write is logged and swallowed, since the worker has nowhere left to
/// report it.
pub async fn run_job(
    job_id: JobId,
    registry: Arc<JobRegistry>,
    fetcher: Arc<Fetcher>,
    media: Arc<dyn MediaOps>,
    work_dir: PathBuf,
    request: CombineRequest,
    output_path: PathBuf,
) {
    match run(&fetcher, media.as_ref(), &work_dir, &request, &output_path).await {
        Ok(()) => {
            metrics::record_job_completed("async");
            if let Err(e) = registry.mark_done(&job_id, output_path).await {
                error!(job_id = %job_id, "Failed to mark job done: {}", e);
            }
        }
        Err(e) => {
            metrics::record_job_failed("async");
            warn!(job_id = %job_id, "Job failed: {}", e);
            if let Err(e) = registry.mark_failed(&job_id, e.to_string()).await {
                error!(job_id = %job_id, "Failed to mark job failed: {}", e);
            }
        }
    }
}
