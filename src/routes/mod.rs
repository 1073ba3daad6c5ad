//! HTTP Routes for the Summarization Server
//!
//! Provides the paid submission endpoint, status polling, and health
//! endpoints. Payment enforcement itself lives in an external middleware.

pub mod health;
pub mod summarize;

use axum::Router;

use crate::state::AppState;

/// Create all routes
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(summarize::routes())
        .with_state(state)
}
