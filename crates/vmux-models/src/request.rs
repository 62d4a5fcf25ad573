//! Request and response bodies for the combine endpoints.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError};

use crate::job::{JobId, JobState};

/// Default output duration in seconds (10 minutes).
pub const DEFAULT_MAX_DURATION: f64 = 600.0;

/// Body for `POST /combine-videos` and `POST /combine-videos-async`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CombineRequest {
    /// Ordered list of remote video URLs.
    #[validate(length(min = 1, message = "video_links must not be empty"))]
    #[validate(custom(function = "validate_http_urls"))]
    pub video_links: Vec<String>,

    /// Remote audio URL overlaid on the combined video.
    #[validate(custom(function = "validate_http_url"))]
    pub audio_link: String,

    /// Target output duration in seconds. Defaults to 600.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
}

impl CombineRequest {
    /// Target duration with the default applied.
    pub fn target_duration(&self) -> f64 {
        self.max_duration.unwrap_or(DEFAULT_MAX_DURATION)
    }

    /// Full request validation: field constraints plus a positive target.
    ///
    /// Runs before any I/O so bad requests never touch the network.
    pub fn validate_request(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        let target = self.target_duration();
        if !target.is_finite() || target <= 0.0 {
            return Err(format!("max_duration must be positive, got {}", target));
        }
        Ok(())
    }
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    let url = Url::parse(value).map_err(|_| ValidationError::new("invalid_url"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::new("unsupported_url_scheme"));
    }
    Ok(())
}

fn validate_http_urls(values: &Vec<String>) -> Result<(), ValidationError> {
    for value in values {
        validate_http_url(value)?;
    }
    Ok(())
}

/// Response body for `POST /combine-videos-async`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobAccepted {
    pub job_id: JobId,
    pub status: JobState,
    /// Where the output will land once the job completes.
    pub output_file: String,
}

/// Status body returned by `GET /download/{job_id}` while the job is not
/// Done, and on failure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusBody {
    pub job_id: JobId,
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CombineRequest {
        CombineRequest {
            video_links: vec![
                "https://cdn.example.com/a.mp4".to_string(),
                "https://cdn.example.com/b.mp4".to_string(),
            ],
            audio_link: "https://cdn.example.com/track.mp3".to_string(),
            max_duration: Some(120.0),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate_request().is_ok());
    }

    #[test]
    fn test_empty_video_links_rejected() {
        let mut req = valid_request();
        req.video_links.clear();
        assert!(req.validate_request().is_err());
    }

    #[test]
    fn test_bad_url_rejected() {
        let mut req = valid_request();
        req.video_links.push("not a url".to_string());
        assert!(req.validate_request().is_err());

        let mut req = valid_request();
        req.audio_link = "ftp://example.com/a.mp3".to_string();
        assert!(req.validate_request().is_err());
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut req = valid_request();
        req.max_duration = Some(0.0);
        assert!(req.validate_request().is_err());
        req.max_duration = Some(-5.0);
        assert!(req.validate_request().is_err());
    }

    #[test]
    fn test_default_duration_applied() {
        let mut req = valid_request();
        req.max_duration = None;
        assert_eq!(req.target_duration(), DEFAULT_MAX_DURATION);
        assert!(req.validate_request().is_ok());
    }

    #[test]
    fn test_deserialize_minimal_body() {
        let req: CombineRequest = serde_json::from_str(
            r#"{"video_links":["https://x.test/v.mp4"],"audio_link":"https://x.test/a.mp3"}"#,
        )
        .unwrap();
        assert_eq!(req.video_links.len(), 1);
        assert!(req.max_duration.is_none());
    }
}
