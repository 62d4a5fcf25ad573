//! HTTP fetching of remote source files.
//!
//! Source clips and the audio track are plain file URLs, so a streaming
//! reqwest GET is all that is needed. A failed transfer leaves nothing
//! behind: partial files are removed before the error propagates.

use std::path::Path;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};

/// HTTP fetcher for remote media sources.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Build on an existing client (shared connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download `url` to `dest`, streaming the body to disk.
    ///
    /// Fails on non-success status or transfer errors. On failure any
    /// partially written file is removed.
    pub async fn fetch_to(&self, url: &str, dest: impl AsRef<Path>) -> MediaResult<()> {
        let dest = dest.as_ref();
        let start = Instant::now();

        let result = self.fetch_inner(url, dest).await;

        if result.is_err() && dest.exists() {
            if let Err(e) = fs::remove_file(dest).await {
                warn!(
                    "Failed to remove partial download {}: {}",
                    dest.display(),
                    e
                );
            }
        }

        if result.is_ok() {
            metrics::histogram!("vmux_fetch_duration_seconds")
                .record(start.elapsed().as_secs_f64());
        }

        result
    }

    async fn fetch_inner(&self, url: &str, dest: &Path) -> MediaResult<()> {
        if let Some(parent) = dest.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let mut file = fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                MediaError::download_failed(format!("transfer from {} failed: {}", url, e))
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(MediaError::download_failed(format!(
                "{} returned an empty body",
                url
            )));
        }

        info!(
            url = %url,
            dest = %dest.display(),
            size_kb = written / 1024,
            "Downloaded source file"
        );

        Ok(())
    }
}

/// Pick a filename extension from the URL path, falling back to `default`.
pub fn extension_from_url(url: &str, default: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .last()?
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
        })
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(char::is_alphanumeric))
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("https://x.test/clip.mp4", "mp4"), "mp4");
        assert_eq!(extension_from_url("https://x.test/a/b/track.mp3", "mp4"), "mp3");
        assert_eq!(extension_from_url("https://x.test/noext", "mp4"), "mp4");
        assert_eq!(
            extension_from_url("https://x.test/clip.mp4?sig=abc", "bin"),
            "mp4"
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake video".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("clip.mp4");
        Fetcher::new()
            .fetch_to(&format!("{}/clip.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(fs::read(&dest).await.unwrap(), b"fake video");
    }

    #[tokio::test]
    async fn test_fetch_error_status_leaves_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing.mp4");
        let err = Fetcher::new()
            .fetch_to(&format!("{}/missing.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_empty_body_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.mp4");
        let err = Fetcher::new()
            .fetch_to(&format!("{}/empty.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists());
    }
}
