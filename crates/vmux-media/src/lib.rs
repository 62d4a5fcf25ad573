//! FFmpeg CLI wrapper and HTTP fetcher for vidmux.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and running
//! - ffprobe-based duration probing
//! - A streaming HTTP fetcher for remote sources
//! - The [`MediaOps`] collaborator trait and its FFmpeg implementation
//! - Job-scoped scratch directories and filesystem helpers

pub mod command;
pub mod error;
pub mod fetch;
pub mod fs_utils;
pub mod ops;
pub mod probe;
pub mod scratch;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fetch::{extension_from_url, Fetcher};
pub use fs_utils::move_file;
pub use ops::{FfmpegOps, MediaOps};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use scratch::JobScratch;
