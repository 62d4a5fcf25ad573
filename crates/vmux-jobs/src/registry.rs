//! In-memory job registry.
//!
//! Process-lifetime map from job id to job record. The registry is the only
//! mutable state shared between request handlers and background workers:
//! status polls take a read lock, the single worker that owns a job takes
//! the write lock for its transitions. Entries are never evicted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use vmux_models::{Job, JobId, JobState};

use crate::error::{RegistryError, RegistryResult};

/// Concurrent job registry.
///
/// Cheap to clone; clones share the same map. Tests build isolated
/// registries with [`JobRegistry::new`].
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Pending job and return a snapshot of it.
    pub async fn create(&self) -> Job {
        let job = Job::new();
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), job.clone());
        info!(job_id = %job.id, "Job created");
        job
    }

    /// Snapshot of a job record.
    pub async fn get(&self, id: &JobId) -> RegistryResult<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Pending -> Processing.
    pub async fn mark_processing(&self, id: &JobId) -> RegistryResult<Job> {
        self.transition(id, JobState::Processing, |job| job.start())
            .await
    }

    /// Processing -> Done, recording the output path.
    pub async fn mark_done(&self, id: &JobId, output_path: PathBuf) -> RegistryResult<Job> {
        self.transition(id, JobState::Done, move |job| job.complete(output_path))
            .await
    }

    /// Pending/Processing -> Failed, recording the error message.
    pub async fn mark_failed(&self, id: &JobId, error: impl Into<String>) -> RegistryResult<Job> {
        let error = error.into();
        self.transition(id, JobState::Failed, move |job| job.fail(error))
            .await
    }

    async fn transition<F>(&self, id: &JobId, to: JobState, apply: F) -> RegistryResult<Job>
    where
        F: FnOnce(Job) -> Job,
    {
        let mut jobs = self.jobs.write().await;
        let current = jobs
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        if !is_valid_transition(current.state, to) {
            return Err(RegistryError::InvalidTransition {
                id: id.clone(),
                from: current.state,
                to,
            });
        }

        let updated = apply(current.clone());
        jobs.insert(id.clone(), updated.clone());
        info!(job_id = %id, state = %updated.state, "Job state updated");
        Ok(updated)
    }
}

/// Pending -> Processing -> {Done, Failed}; terminal states are final.
/// A job can also fail straight from Pending if its worker never starts.
fn is_valid_transition(from: JobState, to: JobState) -> bool {
    matches!(
        (from, to),
        (JobState::Pending, JobState::Processing)
            | (JobState::Pending, JobState::Failed)
            | (JobState::Processing, JobState::Done)
            | (JobState::Processing, JobState::Failed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = JobRegistry::new();
        let job = registry.create().await;

        let fetched = registry.get(&job.id).await.unwrap();
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.state, JobState::Pending);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let registry = JobRegistry::new();
        let id = JobId::from_string("no-such-job");
        assert_eq!(
            registry.get(&id).await.unwrap_err(),
            RegistryError::NotFound(id)
        );
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let registry = JobRegistry::new();
        let job = registry.create().await;

        let processing = registry.mark_processing(&job.id).await.unwrap();
        assert_eq!(processing.state, JobState::Processing);

        let done = registry
            .mark_done(&job.id, PathBuf::from("/out/x.mp4"))
            .await
            .unwrap();
        assert_eq!(done.state, JobState::Done);
        assert_eq!(done.output_path, Some(PathBuf::from("/out/x.mp4")));
    }

    #[tokio::test]
    async fn test_failure_path() {
        let registry = JobRegistry::new();
        let job = registry.create().await;

        registry.mark_processing(&job.id).await.unwrap();
        let failed = registry.mark_failed(&job.id, "fetch blew up").await.unwrap();
        assert_eq!(failed.state, JobState::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("fetch blew up"));
    }

    #[tokio::test]
    async fn test_terminal_states_are_final() {
        let registry = JobRegistry::new();
        let job = registry.create().await;
        registry.mark_processing(&job.id).await.unwrap();
        registry
            .mark_done(&job.id, PathBuf::from("/out/x.mp4"))
            .await
            .unwrap();

        let err = registry.mark_failed(&job.id, "too late").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));

        let err = registry.mark_processing(&job.id).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_pending_can_fail_directly() {
        let registry = JobRegistry::new();
        let job = registry.create().await;
        let failed = registry
            .mark_failed(&job.id, "never started")
            .await
            .unwrap();
        assert_eq!(failed.state, JobState::Failed);
    }

    #[tokio::test]
    async fn test_concurrent_reads_during_write() {
        let registry = JobRegistry::new();
        let job = registry.create().await;

        let mut readers = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let id = job.id.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let snapshot = registry.get(&id).await.unwrap();
                    assert!(matches!(
                        snapshot.state,
                        JobState::Pending | JobState::Processing | JobState::Done
                    ));
                }
            }));
        }

        registry.mark_processing(&job.id).await.unwrap();
        registry
            .mark_done(&job.id, PathBuf::from("/out/x.mp4"))
            .await
            .unwrap();

        for reader in readers {
            reader.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_jobs_are_independent() {
        let registry = JobRegistry::new();
        let a = registry.create().await;
        let b = registry.create().await;

        registry.mark_processing(&a.id).await.unwrap();
        registry.mark_failed(&a.id, "boom").await.unwrap();

        assert_eq!(registry.get(&b.id).await.unwrap().state, JobState::Pending);
    }
}
