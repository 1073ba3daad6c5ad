//! Server Configuration
//!
//! Handles loading configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Minimum meaningful document length
pub const MIN_DOCUMENT_LENGTH: usize = 50;
/// ~100K tokens (rough estimate: 4 chars per token)
pub const MAX_DOCUMENT_LENGTH: usize = 400_000;

/// AI backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    Gaia,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::Gaia => "gaia",
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "gaia" => Provider::Gaia,
            _ => Provider::Ollama,
        }
    }
}

/// Response-signing mode, selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// No key material; responses are delivered unsigned
    Disabled,
    /// Locally generated random key, for development and testing
    Mock,
    /// Key generated and held by the ROFL keymanager
    Attested,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Selected AI backend
    pub provider: Provider,
    /// Ollama server URL
    pub ollama_host: String,
    /// Ollama model name
    pub ollama_model: String,
    /// Gaia node URL (required for the gaia provider)
    pub gaia_node_url: Option<String>,
    /// Gaia model name
    pub gaia_model_name: String,
    /// Gaia API key (required for the gaia provider)
    pub gaia_api_key: Option<String>,
    /// Response-signing mode
    pub signing_mode: SigningMode,
    /// ROFL appd endpoint for key generation and metadata
    pub rofl_appd_url: String,
    /// Payment receiving address (read by the payment middleware as well)
    pub pay_to_address: Option<String>,
    /// x402 network name
    pub x402_network: String,
    /// x402 price per request
    pub x402_price: String,
    /// Log level
    pub log_level: String,
    /// Enable JSON logging
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4021
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen2:0.5b".to_string()
}

fn default_gaia_model() -> String {
    "Qwen3-30B-A3B-Q5_K_M".to_string()
}

fn default_rofl_appd_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_network() -> String {
    "base-sepolia".to_string()
}

fn default_price() -> String {
    "$0.001".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            provider: Provider::Ollama,
            ollama_host: default_ollama_host(),
            ollama_model: default_ollama_model(),
            gaia_node_url: None,
            gaia_model_name: default_gaia_model(),
            gaia_api_key: None,
            signing_mode: SigningMode::Disabled,
            rofl_appd_url: default_rofl_appd_url(),
            pay_to_address: None,
            x402_network: default_network(),
            x402_price: default_price(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            provider: std::env::var("AI_PROVIDER")
                .map(|s| Provider::parse(&s))
                .unwrap_or(Provider::Ollama),
            ollama_host: std::env::var("OLLAMA_HOST").unwrap_or_else(|_| default_ollama_host()),
            ollama_model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| default_ollama_model()),
            gaia_node_url: std::env::var("GAIA_NODE_URL").ok(),
            gaia_model_name: std::env::var("GAIA_MODEL_NAME")
                .unwrap_or_else(|_| default_gaia_model()),
            gaia_api_key: std::env::var("GAIA_API_KEY").ok(),
            signing_mode: signing_mode_from_env(),
            rofl_appd_url: std::env::var("ROFL_APPD_URL")
                .unwrap_or_else(|_| default_rofl_appd_url()),
            pay_to_address: std::env::var("ADDRESS").ok(),
            x402_network: std::env::var("X402_NETWORK").unwrap_or_else(|_| default_network()),
            x402_price: std::env::var("X402_PRICE").unwrap_or_else(|_| default_price()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_log_level()),
            json_logs: std::env::var("JSON_LOGS").unwrap_or_default() == "true",
        }
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }
}

/// `DEBUG_SIGNING=true` forces a local mock key; otherwise signing is only
/// active in production, where the ROFL keymanager is reachable.
fn signing_mode_from_env() -> SigningMode {
    if std::env::var("DEBUG_SIGNING").unwrap_or_default().to_ascii_lowercase() == "true" {
        return SigningMode::Mock;
    }
    match std::env::var("ENVIRONMENT").as_deref() {
        Ok("production") => SigningMode::Attested,
        _ => SigningMode::Disabled,
    }
}
