//! Gemini generation backend.
//!
//! Calls the `generateContent` endpoint in JSON mode and returns the raw
//! response text. HTTP 429 maps to [`Error::RateLimited`] so the drafting
//! client's retry loop can tell throttling apart from hard failures; other
//! non-success statuses and transport errors map to [`Error::ExternalService`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use taskhive_core::{Error, GenerationBackend, Result};

use crate::config::DraftingConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Hosted Gemini backend.
pub struct GeminiBackend {
    client: Client,
    config: DraftingConfig,
}

impl GeminiBackend {
    pub fn new(config: DraftingConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "ai",
            component = "gemini",
            url = %config.base_url,
            model = %config.model,
            "initializing generation backend"
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(DraftingConfig::from_env()?)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.7,
            },
        };

        debug!(
            subsystem = "ai",
            component = "gemini",
            prompt_len = prompt.len(),
            "sending generation request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("Generation request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "ai",
                component = "gemini",
                "generation request throttled"
            );
            return Err(Error::RateLimited(format!(
                "Generation service throttled the request: {}",
                detail
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Generation service returned {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Malformed generation response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::ExternalService("Generation response contained no candidates".to_string())
            })?;

        debug!(
            subsystem = "ai",
            component = "gemini",
            response_len = text.len(),
            "generation request succeeded"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let mut config = DraftingConfig::new("key");
        config.base_url = "https://example.test/v1beta/".to_string();
        config.model = "gemini-2.0-flash".to_string();
        let backend = GeminiBackend::new(config).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\":1}"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }
}
