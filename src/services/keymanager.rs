//! Client for the ROFL appd key-management facility.
//!
//! The keymanager generates and holds signing keys inside the TEE; this
//! client only ever sees the derived material it chooses to hand out. The
//! boundary is a trait so the signing service can be provisioned against a
//! mock in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum KeyManagerError {
    #[error("keymanager request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("keymanager returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Key-management facility boundary.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Generate (or fetch the existing) SECP256K1 key registered under
    /// `key_id`, returned as a hex-encoded private scalar.
    async fn generate_key(&self, key_id: &str) -> Result<String, KeyManagerError>;

    /// Publish discoverability metadata for this app instance.
    async fn set_metadata(&self, metadata: HashMap<String, String>)
        -> Result<(), KeyManagerError>;
}

#[derive(Serialize)]
struct GenerateKeyRequest<'a> {
    key_id: &'a str,
    kind: &'a str,
}

#[derive(Deserialize)]
struct GenerateKeyResponse {
    key: String,
}

/// HTTP client for the ROFL appd REST surface.
pub struct RoflAppdClient {
    base_url: String,
    http: reqwest::Client,
}

impl RoflAppdClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl KeyManager for RoflAppdClient {
    async fn generate_key(&self, key_id: &str) -> Result<String, KeyManagerError> {
        let url = format!("{}/rofl/v1/keys/generate", self.base_url);
        debug!(%url, key_id, "Requesting key generation");

        let response = self
            .http
            .post(&url)
            .json(&GenerateKeyRequest {
                key_id,
                kind: "secp256k1",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(KeyManagerError::Status(response.status()));
        }

        let body: GenerateKeyResponse = response.json().await?;
        Ok(body.key)
    }

    async fn set_metadata(
        &self,
        metadata: HashMap<String, String>,
    ) -> Result<(), KeyManagerError> {
        let url = format!("{}/rofl/v1/app/metadata", self.base_url);
        debug!(%url, "Publishing metadata");

        let response = self.http.post(&url).json(&metadata).send().await?;

        // appd answers 200 with an empty body; only the status matters here.
        if !response.status().is_success() {
            return Err(KeyManagerError::Status(response.status()));
        }
        Ok(())
    }
}
