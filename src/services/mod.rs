//! Services for the summarization server.
//!
//! Contains the core business logic: job handling, response signing, and
//! the external collaborator clients.

pub mod canonical;
pub mod jobs;
pub mod keymanager;
pub mod signing;
pub mod summarizer;

pub use jobs::{InMemoryJobStore, JobRunner, JobStore};
pub use signing::SigningService;
pub use summarizer::Summarizer;
