//! Media operations collaborator.
//!
//! The pipeline talks to FFmpeg through the [`MediaOps`] trait so tests can
//! substitute a mock and never spawn a real binary. [`FfmpegOps`] is the
//! production implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use vmux_models::{EncodingConfig, Plan};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe;

/// Long-running, blocking media operations delegated to an external tool.
#[async_trait]
pub trait MediaOps: Send + Sync {
    /// Duration of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Render `plan` over the downloaded `sources` into one continuous
    /// video stream at `output`. Segment order, offsets, and lengths are
    /// honored exactly; the output duration equals the plan total.
    async fn concatenate(
        &self,
        sources: &[PathBuf],
        plan: &Plan,
        output: &Path,
    ) -> MediaResult<()>;

    /// Overlay `audio` onto `video`, writing `output`. Audio shorter than
    /// the video is looped; audio longer than `max_duration` is trimmed.
    async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        max_duration: f64,
        output: &Path,
    ) -> MediaResult<()>;
}

/// FFmpeg-backed implementation of [`MediaOps`].
#[derive(Debug, Clone)]
pub struct FfmpegOps {
    encoding: EncodingConfig,
}

impl Default for FfmpegOps {
    fn default() -> Self {
        Self::new(EncodingConfig::default())
    }
}

impl FfmpegOps {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self { encoding }
    }

    /// Render one plan segment to its own file.
    ///
    /// Segments are re-encoded with a shared profile (and without audio,
    /// which the mux step replaces wholesale) so the concat demuxer can
    /// stream-copy them afterwards.
    async fn render_segment(
        &self,
        source: &Path,
        start: f64,
        length: f64,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(source, output)
            .seek(start)
            .duration(length)
            .video_codec(&self.encoding.codec)
            .output_arg("-preset")
            .output_arg(&self.encoding.preset)
            .output_arg("-crf")
            .output_arg(self.encoding.crf.to_string())
            .output_arg("-an");

        FfmpegRunner::from_env().run(&cmd).await
    }
}

#[async_trait]
impl MediaOps for FfmpegOps {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe::probe_duration(path).await
    }

    async fn concatenate(
        &self,
        sources: &[PathBuf],
        plan: &Plan,
        output: &Path,
    ) -> MediaResult<()> {
        if let Some(max_source) = plan.max_source() {
            if max_source >= sources.len() {
                return Err(MediaError::internal(format!(
                    "plan references source {} but only {} files were downloaded",
                    max_source,
                    sources.len()
                )));
            }
        }

        let start = Instant::now();
        let work_dir = tempfile::tempdir()?;

        info!(
            segments = plan.len(),
            total_secs = plan.total_length(),
            "Rendering concatenation plan"
        );

        let mut part_paths = Vec::with_capacity(plan.len());
        for (index, segment) in plan.segments().iter().enumerate() {
            let part = work_dir.path().join(format!("part_{:03}.mp4", index));
            self.render_segment(
                &sources[segment.source],
                segment.start,
                segment.length,
                &part,
            )
            .await?;
            part_paths.push(part);
        }

        let list_path = work_dir.path().join("concat.txt");
        fs::write(&list_path, concat_list(&part_paths)).await?;

        // Parts share codec parameters, so the demuxer can stream-copy.
        let cmd = FfmpegCommand::new(&list_path, output)
            .input_args(["-f", "concat", "-safe", "0"])
            .codec_copy();
        FfmpegRunner::from_env().run(&cmd).await?;

        metrics::histogram!("vmux_ffmpeg_duration_seconds", "op" => "concatenate")
            .record(start.elapsed().as_secs_f64());

        info!(output = %output.display(), "Concatenation complete");
        Ok(())
    }

    async fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        max_duration: f64,
        output: &Path,
    ) -> MediaResult<()> {
        if !video.exists() {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }

        let start = Instant::now();

        // -stream_loop -1 repeats the audio until -t cuts the output, which
        // covers both the shorter-audio (loop) and longer-audio (trim) case.
        let cmd = FfmpegCommand::new(video, output)
            .input(audio)
            .loop_input()
            .map("0:v:0")
            .map("1:a:0")
            .video_codec("copy")
            .audio_codec(&self.encoding.audio_codec)
            .output_arg("-b:a")
            .output_arg(&self.encoding.audio_bitrate)
            .duration(max_duration);

        FfmpegRunner::from_env().run(&cmd).await?;

        metrics::histogram!("vmux_ffmpeg_duration_seconds", "op" => "mux_audio")
            .record(start.elapsed().as_secs_f64());

        info!(output = %output.display(), "Audio mux complete");
        Ok(())
    }
}

/// Build a concat demuxer list file body.
///
/// Single quotes inside paths use the `'\''` escape the demuxer expects.
fn concat_list(parts: &[PathBuf]) -> String {
    let mut body = String::new();
    for part in parts {
        let escaped = part.to_string_lossy().replace('\'', "'\\''");
        body.push_str(&format!("file '{}'\n", escaped));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmux_models::Plan;

    #[test]
    fn test_concat_list_format() {
        let parts = vec![PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/b.mp4")];
        assert_eq!(
            concat_list(&parts),
            "file '/tmp/a.mp4'\nfile '/tmp/b.mp4'\n"
        );
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let parts = vec![PathBuf::from("/tmp/it's.mp4")];
        assert_eq!(concat_list(&parts), "file '/tmp/it'\\''s.mp4'\n");
    }

    #[tokio::test]
    async fn test_concatenate_rejects_short_source_list() {
        let ops = FfmpegOps::default();
        let plan = Plan::fit(&[5.0, 5.0], 8.0).unwrap();
        let err = ops
            .concatenate(
                &[PathBuf::from("/tmp/only_one.mp4")],
                &plan,
                Path::new("/tmp/out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Internal(_)));
    }

    #[tokio::test]
    async fn test_mux_audio_missing_inputs() {
        let ops = FfmpegOps::default();
        let err = ops
            .mux_audio(
                Path::new("/nonexistent/video.mp4"),
                Path::new("/nonexistent/audio.mp3"),
                10.0,
                Path::new("/tmp/out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
