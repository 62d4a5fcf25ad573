//! Application state.

use std::sync::Arc;

use vmux_jobs::JobRegistry;
use vmux_media::{Fetcher, FfmpegOps, MediaOps};

use crate::config::ApiConfig;

/// Shared application state.
///
/// The media operations and fetcher collaborators are injected so tests can
/// swap in mocks; the registry is per-instance, never ambient.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub registry: Arc<JobRegistry>,
    pub media: Arc<dyn MediaOps>,
    pub fetcher: Arc<Fetcher>,
}

impl AppState {
    /// Create production state: FFmpeg-backed media ops and a real fetcher.
    pub fn new(config: ApiConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.output_dir)?;
        std::fs::create_dir_all(&config.work_dir)?;

        Ok(Self {
            config,
            registry: Arc::new(JobRegistry::new()),
            media: Arc::new(FfmpegOps::default()),
            fetcher: Arc::new(Fetcher::new()),
        })
    }

    /// Build state from explicit collaborators (used by tests).
    pub fn with_collaborators(
        config: ApiConfig,
        registry: Arc<JobRegistry>,
        media: Arc<dyn MediaOps>,
        fetcher: Arc<Fetcher>,
    ) -> Self {
        Self {
            config,
            registry,
            media,
            fetcher,
        }
    }
}
