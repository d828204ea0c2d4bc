//! Gemini Developer API backend.

use async_trait::async_trait;
use nexus_types::ConfigError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::cascade::{BackendError, ModelBackend};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

fn resolve_base_url(explicit: Option<&str>) -> String {
    let Some(raw) = explicit else {
        return DEFAULT_GEMINI_BASE_URL.to_string();
    };
    let url = raw.trim().trim_end_matches('/').to_string();
    if url.is_empty() {
        tracing::warn!("Gemini base URL is empty, using default");
        return DEFAULT_GEMINI_BASE_URL.to_string();
    }
    if url::Url::parse(&url).is_err() {
        tracing::warn!("Gemini base URL is not a valid URL, using default");
        return DEFAULT_GEMINI_BASE_URL.to_string();
    }
    url
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a backend with the given HTTP client and key.
    ///
    /// An empty key is a configuration error: every call would fail as fatal.
    pub fn new(
        http_client: Client,
        api_key: impl Into<String>,
        base_url: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing { name: API_KEY_ENV.to_string() });
        }
        Ok(Self { http_client, base_url: resolve_base_url(base_url), api_key })
    }

    /// Read the key from `GEMINI_API_KEY`.
    pub fn from_env(http_client: Client, base_url: Option<&str>) -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(http_client, api_key, base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let body = GenerateContentRequest {
            contents: [Content { role: "user", parts: [Part { text: prompt }] }],
        };

        let response = self
            .http_client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    BackendError::new(format!("503 upstream temporarily unavailable: {}", e))
                } else {
                    BackendError::new(format!("Request to {} failed: {}", model, e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::new(format!("503 failed to read response body: {}", e)))?;

        if !status.is_success() {
            tracing::debug!(model = model, status = status.as_u16(), "Gemini returned an error");
            return Err(BackendError::http(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::new(format!("Malformed response from {}: {}", model, e)))?;

        parsed.text().ok_or_else(|| {
            BackendError::new(format!("Response not available: {} returned no text", model))
        })
    }
}
