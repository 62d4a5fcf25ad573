//! Health and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use vmux_media::{check_ffmpeg, check_ffprobe};

use crate::state::AppState;

#[derive(Serialize)]
struct CheckStatus {
    healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            healthy: true,
            detail: None,
        }
    }

    fn failed(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    checks: ReadyChecks,
}

#[derive(Serialize)]
struct ReadyChecks {
    ffmpeg: CheckStatus,
    ffprobe: CheckStatus,
    output_dir: CheckStatus,
}

/// `GET /` - service banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "vidmux",
        "message": "POST /combine-videos or /combine-videos-async to combine remote clips",
    }))
}

/// `GET /health` - liveness. Always OK while the process serves requests.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /ready` - readiness. Verifies the external tools are installed and
/// the output directory is writable.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let ffmpeg = match check_ffmpeg() {
        Ok(_) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(e.to_string()),
    };

    let ffprobe = match check_ffprobe() {
        Ok(_) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(e.to_string()),
    };

    let output_dir = match check_writable(&state.config.output_dir) {
        Ok(()) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(e),
    };

    let all_healthy = ffmpeg.healthy && ffprobe.healthy && output_dir.healthy;
    let (status_code, status) = if all_healthy {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    };

    (
        status_code,
        Json(ReadyResponse {
            status,
            checks: ReadyChecks {
                ffmpeg,
                ffprobe,
                output_dir,
            },
        }),
    )
}

fn check_writable(dir: &std::path::Path) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;
    let probe = dir.join(".writable");
    std::fs::write(&probe, b"ok").map_err(|e| format!("cannot write {}: {}", dir.display(), e))?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}
