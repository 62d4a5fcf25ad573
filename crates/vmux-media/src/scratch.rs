//! Job-scoped scratch directories.
//!
//! Every job gets its own temp directory for downloaded sources and
//! intermediate renders. The directory is removed when the scratch handle
//! drops, which covers both the success and the failure path.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::MediaResult;

/// Scratch space for one job's temporary files.
#[derive(Debug)]
pub struct JobScratch {
    dir: TempDir,
}

impl JobScratch {
    /// Create a scratch directory under `base` (created if missing).
    pub fn new_in(base: impl AsRef<Path>) -> MediaResult<Self> {
        let base = base.as_ref();
        std::fs::create_dir_all(base)?;
        let dir = TempDir::with_prefix_in("job-", base)?;
        Ok(Self { dir })
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for the n-th downloaded source clip.
    pub fn clip_path(&self, index: usize, ext: &str) -> PathBuf {
        self.dir.path().join(format!("clip_{:03}.{}", index, ext))
    }

    /// Path for the downloaded audio track.
    pub fn audio_path(&self, ext: &str) -> PathBuf {
        self.dir.path().join(format!("audio.{}", ext))
    }

    /// Path for the concatenated video before audio muxing.
    pub fn concat_output_path(&self) -> PathBuf {
        self.dir.path().join("combined_video.mp4")
    }

    /// Path for the final mux output inside scratch space.
    pub fn mux_output_path(&self) -> PathBuf {
        self.dir.path().join("combined_final.mp4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir as TestDir;

    #[test]
    fn test_scratch_lifecycle() {
        let base = TestDir::new().unwrap();
        let root;
        {
            let scratch = JobScratch::new_in(base.path()).unwrap();
            root = scratch.path().to_path_buf();
            assert!(root.exists());
            assert!(root.starts_with(base.path()));

            std::fs::write(scratch.clip_path(0, "mp4"), b"x").unwrap();
            assert!(scratch.clip_path(0, "mp4").exists());
        }
        // Dropped: everything is gone.
        assert!(!root.exists());
    }

    #[test]
    fn test_paths_are_distinct() {
        let base = TestDir::new().unwrap();
        let scratch = JobScratch::new_in(base.path()).unwrap();
        assert_ne!(scratch.clip_path(0, "mp4"), scratch.clip_path(1, "mp4"));
        assert_ne!(scratch.concat_output_path(), scratch.mux_output_path());
    }
}
