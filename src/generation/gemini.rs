//! Google Gemini `generateContent` backend.

use serde::Deserialize;
use serde_json::json;

use super::{GenerationError, TextBackend, folded_prompt};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiBackend {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

/// Concatenates the text parts of the first candidate.
fn parse_generate_content(raw: &str) -> Result<String, GenerationError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(raw).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        Err(GenerationError::Empty)
    } else {
        Ok(text)
    }
}

impl TextBackend for GeminiBackend {
    async fn complete(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        let full_prompt = folded_prompt(&self.system_prompt, prompt, context);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": full_prompt }] }]
        });

        let response = self
            .client
            .post(self.generate_content_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.model, "Gemini request failed");
            return Err(GenerationError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        tracing::debug!(model = %self.model, "Gemini completion received");
        parse_generate_content(&raw)
    }
}
