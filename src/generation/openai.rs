//! OpenAI chat completions backend.

use serde::{Deserialize, Serialize};

use super::{GenerationError, TextBackend, user_message};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: OPENAI_API_BASE.to_string(),
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

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

fn parse_chat_response(raw: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse =
        serde_json::from_str(raw).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(GenerationError::Empty)
}

impl TextBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        let user = user_message(prompt, context);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.model, "OpenAI request failed");
            return Err(GenerationError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }

        tracing::debug!(model = %self.model, "OpenAI completion received");
        parse_chat_response(&raw)
    }
}
