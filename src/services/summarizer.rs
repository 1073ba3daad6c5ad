//! Pluggable summarization backends.
//!
//! The job runner only sees the [`Summarizer`] trait; the concrete backend
//! is chosen once at startup from `AI_PROVIDER`. Request timeouts are the
//! backend's own concern.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, Provider};

/// System prompt shared by all backends.
const SYSTEM_PROMPT: &str = "You are an expert document summarizer. Your task is to:\n\
1. Read the provided document carefully\n\
2. Extract the main ideas and key points\n\
3. Create a concise, well-structured summary\n\
4. Identify key topics covered in the document\n\n\
Provide a clear and informative summary that captures the essence of the document.";

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {0}: {1}")]
    Status(reqwest::StatusCode, String),
    #[error("backend returned no summary")]
    EmptyResponse,
}

/// Summarization capability invoked by the job runner.
#[async_trait]
pub trait Summarizer: Send + Sync + std::fmt::Debug {
    /// Summarize `document`, returning the summary text.
    async fn process(&self, document: &str) -> Result<String, SummarizerError>;
}

/// Build the backend named by the configuration.
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn Summarizer>> {
    match config.provider {
        Provider::Ollama => Ok(Arc::new(OllamaSummarizer::new(
            config.ollama_host.clone(),
            config.ollama_model.clone(),
        ))),
        Provider::Gaia => {
            let base_url = config
                .gaia_node_url
                .clone()
                .context("GAIA_NODE_URL is required when using the gaia provider")?;
            let api_key = config
                .gaia_api_key
                .clone()
                .context("GAIA_API_KEY is required when using the gaia provider")?;
            Ok(Arc::new(GaiaSummarizer::new(
                base_url,
                config.gaia_model_name.clone(),
                api_key,
            )))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

fn prompt_messages(document: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: format!("Please summarize the following document:\n\n{document}"),
        },
    ]
}

async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, SummarizerError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(SummarizerError::Status(status, body))
}

// ==================== Ollama ====================

/// Ollama chat backend (`POST {host}/api/chat`).
#[derive(Debug)]
pub struct OllamaSummarizer {
    host: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

impl OllamaSummarizer {
    pub fn new(host: String, model: String) -> Self {
        Self {
            host,
            model,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn process(&self, document: &str) -> Result<String, SummarizerError> {
        let url = format!("{}/api/chat", self.host);
        debug!(%url, model = %self.model, "Requesting summary from Ollama");

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: prompt_messages(document),
            stream: false,
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let body: OllamaChatResponse = error_for_status(response).await?.json().await?;

        if body.message.content.is_empty() {
            return Err(SummarizerError::EmptyResponse);
        }
        Ok(body.message.content)
    }
}

// ==================== Gaia ====================

/// Gaia node backend, speaking the OpenAI-compatible chat completions API.
#[derive(Debug)]
pub struct GaiaSummarizer {
    base_url: String,
    model: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl GaiaSummarizer {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url,
            model,
            api_key,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Summarizer for GaiaSummarizer {
    async fn process(&self, document: &str) -> Result<String, SummarizerError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(%url, model = %self.model, "Requesting summary from Gaia node");

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: prompt_messages(document),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body: ChatCompletionResponse = error_for_status(response).await?.json().await?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(SummarizerError::EmptyResponse)?;
        if choice.message.content.is_empty() {
            return Err(SummarizerError::EmptyResponse);
        }
        Ok(choice.message.content)
    }
}
