//! Application State
//!
//! Shared state for the summarization server, accessible from all route
//! handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, Provider};
use crate::services::jobs::{JobRunner, JobStore};
use crate::services::signing::SigningService;
use crate::services::summarizer::Summarizer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Job table (the only shared mutable state)
    store: Arc<dyn JobStore>,
    /// Background execution of accepted jobs
    runner: JobRunner,
    /// Response signing service
    signer: SigningService,
    /// Configured AI backend
    provider: Provider,
    /// x402 price per request (shown on the root endpoint)
    x402_price: String,
    /// x402 network name
    x402_network: String,
    /// Total jobs accepted since startup
    total_jobs: AtomicU64,
    /// Server start time
    start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        store: Arc<dyn JobStore>,
        summarizer: Arc<dyn Summarizer>,
        signer: SigningService,
        config: &Config,
    ) -> Self {
        let runner = JobRunner::new(Arc::clone(&store), summarizer);
        Self {
            inner: Arc::new(AppStateInner {
                store,
                runner,
                signer,
                provider: config.provider,
                x402_price: config.x402_price.clone(),
                x402_network: config.x402_network.clone(),
                total_jobs: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
        }
    }

    /// Get the job store
    pub fn store(&self) -> &dyn JobStore {
        self.inner.store.as_ref()
    }

    /// Get the job runner
    pub fn runner(&self) -> &JobRunner {
        &self.inner.runner
    }

    /// Get the signing service
    pub fn signer(&self) -> &SigningService {
        &self.inner.signer
    }

    /// Get the configured AI backend
    pub fn provider(&self) -> Provider {
        self.inner.provider
    }

    /// Get the x402 price per request
    pub fn x402_price(&self) -> &str {
        &self.inner.x402_price
    }

    /// Get the x402 network name
    pub fn x402_network(&self) -> &str {
        &self.inner.x402_network
    }

    /// Get total jobs accepted since startup
    pub fn total_jobs(&self) -> u64 {
        self.inner.total_jobs.load(Ordering::Relaxed)
    }

    /// Increment the job counter
    pub fn increment_jobs(&self) {
        self.inner.total_jobs.fetch_add(1, Ordering::Relaxed);
    }

    /// Get server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
