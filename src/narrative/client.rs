//! Generative-text API client.
//!
//! `NarrativeClient` is the seam the narrative service talks through;
//! `GeminiClient` implements it against the Gemini `generateContent` API.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::types::NarrativeError;
use crate::storage::config::NarrativeSettings;

/// Default Gemini API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for journal entries.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Something that turns a prompt into prose.
pub trait NarrativeClient: Send + Sync {
    /// Generate text for a prompt.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, NarrativeError>> + Send;
}

/// Gemini API client.
pub struct GeminiClient {
    /// HTTP client
    http: reqwest::Client,
    /// Base URL for API
    api_base: String,
    /// Model name
    model: String,
    /// API key for authentication
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client with default endpoint and model.
    pub fn new(api_key: Option<String>) -> Result<Self, NarrativeError> {
        Self::with_base_url(
            api_key,
            DEFAULT_API_BASE.to_string(),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(30),
        )
    }

    /// Create a client with custom endpoint, model and request timeout.
    pub fn with_base_url(
        api_key: Option<String>,
        api_base: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, NarrativeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Create a client from settings, reading the key from the configured
    /// environment variable.
    pub fn from_settings(settings: &NarrativeSettings) -> Result<Self, NarrativeError> {
        let api_key = std::env::var(&settings.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; journal generation will fall back",
                settings.api_key_env
            );
        }

        Self::with_base_url(
            api_key,
            settings.api_base.clone(),
            settings.model.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Model used for generation.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    async fn send_request(&self, prompt: &str) -> Result<String, NarrativeError> {
        let api_key = self.api_key.as_ref().ok_or(NarrativeError::ApiKeyMissing)?;

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!("Requesting journal entry from {}", self.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body: GenerateResponse = response.json().await?;
            body.text().ok_or(NarrativeError::EmptyResponse)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(error_for_status(status, &body))
        }
    }
}

/// Map a non-success response to an error.
fn error_for_status(status: StatusCode, body: &str) -> NarrativeError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return NarrativeError::RateLimited;
    }

    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("API returned status {}", status));
    NarrativeError::Api(message)
}

impl NarrativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        self.send_request(prompt).await
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
