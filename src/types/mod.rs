//! Type definitions for the summarization server.
//!
//! Contains all request/response types, the job record, and error codes.

use serde::{Deserialize, Serialize};

/// Error codes returned by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Submitted document is below the minimum length
    DocumentTooShort,
    /// Submitted document is above the maximum length
    DocumentTooLong,
    /// Unknown job identifier
    JobNotFound,
    /// Internal server error
    InternalError,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional additional details
    pub details: Option<serde_json::Value>,
}

// ==================== Request Types ====================

/// Request body for `POST /summarize-doc`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// The document to summarize
    pub document: String,
}

// ==================== Job Model ====================

/// Lifecycle state of a summarization job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, summarization in flight
    Processing,
    /// Summarization finished successfully
    Completed,
    /// Summarization backend raised an error
    Failed,
}

impl JobStatus {
    /// A terminal job never changes again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// A summarization job record.
///
/// Created once in `Processing` state, replaced exactly once with a
/// terminal record by the job runner. Optional fields are skipped during
/// serialization so a processing record is just `{"status", "created_at"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Current lifecycle state
    pub status: JobStatus,
    /// Creation time (epoch seconds)
    pub created_at: i64,
    /// Generated summary (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Whitespace-separated token count of the submitted document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    /// Estimated reading time at 200 words per minute, at least 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time_minutes: Option<u64>,
    /// Short error message (failed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Diagnostic detail for operators (failed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Finalization time (epoch seconds, terminal states only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Job {
    /// Fresh record for a newly accepted submission.
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            created_at: chrono::Utc::now().timestamp(),
            summary: None,
            word_count: None,
            reading_time_minutes: None,
            error: None,
            error_detail: None,
            timestamp: None,
        }
    }

    /// Terminal record for a successful summarization.
    ///
    /// `created_at` is carried over from the stored record when the store
    /// finalizes the job.
    pub fn completed(summary: String, word_count: u64, reading_time_minutes: u64) -> Self {
        Self {
            status: JobStatus::Completed,
            created_at: chrono::Utc::now().timestamp(),
            summary: Some(summary),
            word_count: Some(word_count),
            reading_time_minutes: Some(reading_time_minutes),
            error: None,
            error_detail: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// Terminal record for a failed summarization.
    pub fn failed(error: String, error_detail: String) -> Self {
        Self {
            status: JobStatus::Failed,
            created_at: chrono::Utc::now().timestamp(),
            summary: None,
            word_count: None,
            reading_time_minutes: None,
            error: Some(error),
            error_detail: Some(error_detail),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

// ==================== Response Types ====================

/// Response for an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Job identifier (UUID v4, 128-bit random)
    pub job_id: String,
    /// Always `processing` at submission time
    pub status: JobStatus,
    /// Polling URL for this job
    pub status_url: String,
    /// Configured AI backend name
    pub provider: String,
    /// Submission time (epoch seconds)
    pub timestamp: i64,
}

/// Root endpoint service information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub endpoint: String,
    pub price: String,
    pub network: String,
    pub ai_provider: String,
}

/// Server health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status
    pub status: String,
    /// Server version
    pub version: String,
    /// Whether responses are signed
    pub signing_enabled: bool,
    /// Configured AI backend name
    pub ai_provider: String,
}

/// Server status with more details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server status
    pub status: String,
    /// Server version
    pub version: String,
    /// Configured AI backend name
    pub ai_provider: String,
    /// Signing public key (hex, compressed) if signing is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_public_key: Option<String>,
    /// Total jobs accepted since startup
    pub total_jobs: u64,
    /// Uptime in seconds
    pub uptime_secs: u64,
}
