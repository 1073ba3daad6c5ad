//! Document submission and status endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::config::{MAX_DOCUMENT_LENGTH, MIN_DOCUMENT_LENGTH};
use crate::state::AppState;
use crate::types::{DocumentRequest, ErrorCode, ErrorResponse, JobStatus, SubmitResponse};

/// Create summarization routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/summarize-doc", post(submit_document))
        .route("/summarize-doc/:job_id", get(job_status))
}

fn error_body(code: ErrorCode, message: String) -> Json<serde_json::Value> {
    Json(
        serde_json::to_value(ErrorResponse {
            code,
            message,
            details: None,
        })
        .unwrap(),
    )
}

/// Submit a document for summarization
/// POST /summarize-doc
#[instrument(skip(state, request))]
async fn submit_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> impl IntoResponse {
    let doc_length = request.document.len();

    if doc_length < MIN_DOCUMENT_LENGTH {
        return (
            StatusCode::BAD_REQUEST,
            error_body(
                ErrorCode::DocumentTooShort,
                format!("Document too short. Minimum length is {MIN_DOCUMENT_LENGTH} characters."),
            ),
        );
    }

    if doc_length > MAX_DOCUMENT_LENGTH {
        return (
            StatusCode::BAD_REQUEST,
            error_body(
                ErrorCode::DocumentTooLong,
                format!(
                    "Document too long. Maximum length is {MAX_DOCUMENT_LENGTH} characters (~100K tokens)."
                ),
            ),
        );
    }

    let job_id = uuid::Uuid::new_v4().to_string();
    if let Err(e) = state.store().create(&job_id).await {
        // Random 128-bit identifiers should never collide.
        error!(job_id = %job_id, error = %e, "Failed to create job");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body(ErrorCode::InternalError, "Failed to create job".to_string()),
        );
    }

    state.runner().submit(job_id.clone(), request.document);
    state.increment_jobs();

    info!(job_id = %job_id, doc_length, "Job created");

    let response = SubmitResponse {
        status_url: format!("/summarize-doc/{job_id}"),
        job_id,
        status: JobStatus::Processing,
        provider: state.provider().as_str().to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    (
        StatusCode::OK,
        Json(serde_json::to_value(response).unwrap()),
    )
}

/// Get the status of a summarization job
/// GET /summarize-doc/{job_id}
#[instrument(skip(state))]
async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match state.store().get(&job_id).await {
        Some(job) => {
            let payload = serde_json::to_value(&job).unwrap();
            // Best-effort: returned unsigned if no key material is present.
            let signed = state.signer().sign_response(&payload);
            (StatusCode::OK, Json(signed))
        }
        None => (
            StatusCode::NOT_FOUND,
            error_body(ErrorCode::JobNotFound, "Job not found".to_string()),
        ),
    }
}
