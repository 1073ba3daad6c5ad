//! Job storage and background execution.
//!
//! The job table is the only mutable state shared across requests. Records
//! are replaced whole on finalize so a concurrent reader never observes a
//! partially written record, and a job transitions to a terminal state at
//! most once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::services::summarizer::Summarizer;
use crate::types::Job;

/// Words-per-minute assumption behind `reading_time_minutes`.
const READING_WORDS_PER_MINUTE: u64 = 200;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("job {0} already exists")]
    DuplicateJob(String),
    #[error("job {0} not found")]
    NotFound(String),
    #[error("job {0} already reached a terminal state")]
    AlreadyFinalized(String),
}

/// Concurrency-safe job table.
///
/// In-memory by default; the trait is the seam for backing the table with
/// an external store.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a fresh `processing` record for `id`.
    async fn create(&self, id: &str) -> Result<(), JobStoreError>;

    /// Replace the record for `id` with a terminal one, preserving the
    /// original `created_at`. A second terminal write is rejected.
    async fn finalize(&self, id: &str, terminal: Job) -> Result<(), JobStoreError>;

    /// Point lookup; clones the record out of the table.
    async fn get(&self, id: &str) -> Option<Job>;
}

/// In-memory job store.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, id: &str) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(id) {
            return Err(JobStoreError::DuplicateJob(id.to_string()));
        }
        jobs.insert(id.to_string(), Job::processing());
        Ok(())
    }

    async fn finalize(&self, id: &str, mut terminal: Job) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let existing = jobs
            .get(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        if existing.status.is_terminal() {
            return Err(JobStoreError::AlreadyFinalized(id.to_string()));
        }
        terminal.created_at = existing.created_at;
        jobs.insert(id.to_string(), terminal);
        Ok(())
    }

    async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }
}

/// Runs summarization off the request path and writes the terminal state
/// back into the store exactly once per submission.
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl JobRunner {
    pub fn new(store: Arc<dyn JobStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// Schedule `document` for summarization under `id`; returns
    /// immediately. The capability is invoked exactly once, and exactly one
    /// of the completed/failed finalize paths runs.
    pub fn submit(&self, id: String, document: String) {
        let store = Arc::clone(&self.store);
        let summarizer = Arc::clone(&self.summarizer);

        tokio::spawn(async move {
            let terminal = match summarizer.process(&document).await {
                Ok(summary) => {
                    let word_count = count_words(&document);
                    info!(job_id = %id, word_count, "Summarization completed");
                    Job::completed(summary, word_count, reading_time_minutes(word_count))
                }
                Err(e) => {
                    error!(job_id = %id, error = %e, "Summarization failed");
                    Job::failed(e.to_string(), format!("{e:?}"))
                }
            };

            if let Err(e) = store.finalize(&id, terminal).await {
                error!(job_id = %id, error = %e, "Failed to record job result");
            }
        });
    }
}

/// Whitespace-separated token count of the submitted document.
pub fn count_words(document: &str) -> u64 {
    document.split_whitespace().count() as u64
}

/// Estimated reading time at 200 words per minute, never below one minute.
pub fn reading_time_minutes(word_count: u64) -> u64 {
    (word_count / READING_WORDS_PER_MINUTE).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::summarizer::SummarizerError;
    use crate::types::JobStatus;
    use std::time::Duration;

    #[derive(Debug)]
    struct FixedSummarizer(&'static str);

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn process(&self, _document: &str) -> Result<String, SummarizerError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug)]
    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn process(&self, _document: &str) -> Result<String, SummarizerError> {
            Err(SummarizerError::EmptyResponse)
        }
    }

    async fn wait_for_terminal(store: &InMemoryJobStore, id: &str) -> Job {
        for _ in 0..100 {
            if let Some(job) = store.get(id).await {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never reached a terminal state");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("one two three"), 3);
        assert_eq!(count_words(&"A".repeat(50)), 1);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("a\nb\tc  d"), 4);
    }

    #[test]
    fn test_reading_time_minutes() {
        assert_eq!(reading_time_minutes(0), 1);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(199), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(400), 2);
        assert_eq!(reading_time_minutes(1000), 5);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryJobStore::new();
        store.create("job-1").await.unwrap();

        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.summary.is_none());
        assert!(store.get("job-2").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = InMemoryJobStore::new();
        store.create("job-1").await.unwrap();
        assert_eq!(
            store.create("job-1").await,
            Err(JobStoreError::DuplicateJob("job-1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_finalize_preserves_created_at() {
        let store = InMemoryJobStore::new();
        store.create("job-1").await.unwrap();
        let created_at = store.get("job-1").await.unwrap().created_at;

        store
            .finalize("job-1", Job::completed("summary".to_string(), 10, 1))
            .await
            .unwrap();

        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.created_at, created_at);
        assert_eq!(job.word_count, Some(10));
        assert!(job.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_second_finalize_rejected() {
        let store = InMemoryJobStore::new();
        store.create("job-1").await.unwrap();
        store
            .finalize("job-1", Job::completed("first".to_string(), 1, 1))
            .await
            .unwrap();

        assert_eq!(
            store
                .finalize("job-1", Job::failed("late".to_string(), "late".to_string()))
                .await,
            Err(JobStoreError::AlreadyFinalized("job-1".to_string()))
        );

        // First terminal record is preserved.
        let job = store.get("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.summary.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_finalize_unknown_job() {
        let store = InMemoryJobStore::new();
        assert_eq!(
            store
                .finalize("ghost", Job::completed("s".to_string(), 1, 1))
                .await,
            Err(JobStoreError::NotFound("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_independent() {
        let store = Arc::new(InMemoryJobStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(&format!("job-{i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        for i in 0..32 {
            assert!(store.get(&format!("job-{i}")).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_runner_completes_job() {
        let store = Arc::new(InMemoryJobStore::new());
        let runner = JobRunner::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Arc::new(FixedSummarizer("a short summary")),
        );

        store.create("job-1").await.unwrap();
        runner.submit("job-1".to_string(), "one two three four".to_string());

        let job = wait_for_terminal(&store, "job-1").await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.summary.as_deref(), Some("a short summary"));
        assert_eq!(job.word_count, Some(4));
        assert_eq!(job.reading_time_minutes, Some(1));
    }

    #[tokio::test]
    async fn test_runner_records_failure() {
        let store = Arc::new(InMemoryJobStore::new());
        let runner = JobRunner::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Arc::new(FailingSummarizer),
        );

        store.create("job-1").await.unwrap();
        runner.submit("job-1".to_string(), "some document text here ok".to_string());

        let job = wait_for_terminal(&store, "job-1").await;
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.is_some());
        assert!(job.error_detail.is_some());
        assert!(job.summary.is_none());
    }

    #[tokio::test]
    async fn test_terminal_state_never_reverts() {
        let store = Arc::new(InMemoryJobStore::new());
        let runner = JobRunner::new(
            Arc::clone(&store) as Arc<dyn JobStore>,
            Arc::new(FixedSummarizer("summary")),
        );

        store.create("job-1").await.unwrap();
        runner.submit("job-1".to_string(), "text ".repeat(20));

        let first = wait_for_terminal(&store, "job-1").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = store.get("job-1").await.unwrap();
        assert_eq!(first.status, second.status);
        assert_eq!(first.timestamp, second.timestamp);
    }
}
