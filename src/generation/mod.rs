//! Response generation.
//!
//! [`ResponseGenerator`] wraps one [`TextBackend`] and retries empty or failed
//! completions with `2^attempt` second backoff. The backend is picked once at
//! startup ([`Backend`]); there is no fallback between backends at runtime.

mod gemini;
mod openai;

use std::future::Future;

use thiserror::Error;

use crate::retry::{Retriable, RetryConfig, RetryResult, retry_with_backoff};

pub use gemini::{GEMINI_API_BASE, GeminiBackend};
pub use openai::{OPENAI_API_BASE, OpenAiBackend};

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, humble, and professional GitHub bot assistant. \
Your responses should be concise, respectful, and actionable. \
Always maintain a friendly and supportive tone. \
Keep responses brief and to the point.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("provider response could not be read: {0}")]
    InvalidResponse(String),

    #[error("provider returned an empty response")]
    Empty,

    #[error("no response after {attempts} attempts; last error: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl Retriable for GenerationError {
    fn is_retriable(&self) -> bool {
        !matches!(self, GenerationError::Exhausted { .. })
    }
}

/// A single text-generation provider.
pub trait TextBackend: Send + Sync {
    /// One completion call: no retries, no trimming.
    fn complete(
        &self,
        prompt: &str,
        context: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// The backend selected by configuration.
#[derive(Debug, Clone)]
pub enum Backend {
    OpenAi(OpenAiBackend),
    Gemini(GeminiBackend),
}

impl Backend {
    pub fn provider(&self) -> &'static str {
        match self {
            Backend::OpenAi(_) => "openai",
            Backend::Gemini(_) => "gemini",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Backend::OpenAi(b) => b.model(),
            Backend::Gemini(b) => b.model(),
        }
    }
}

impl TextBackend for Backend {
    async fn complete(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        match self {
            Backend::OpenAi(b) => b.complete(prompt, context).await,
            Backend::Gemini(b) => b.complete(prompt, context).await,
        }
    }
}

/// Retrying front end over a [`TextBackend`].
#[derive(Debug, Clone)]
pub struct ResponseGenerator<B> {
    backend: B,
    retry: RetryConfig,
}

impl<B: TextBackend> ResponseGenerator<B> {
    /// `max_retries` is the total number of backend calls allowed.
    pub fn new(backend: B, max_retries: u32) -> Self {
        Self {
            backend,
            retry: RetryConfig::powers_of_two(max_retries),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generates a non-empty, trimmed reply.
    pub async fn generate(&self, prompt: &str, context: &str) -> Result<String, GenerationError> {
        let backend = &self.backend;
        let result = retry_with_backoff(self.retry, move || async move {
            let text = backend.complete(prompt, context).await?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(GenerationError::Empty)
            } else {
                Ok(trimmed.to_string())
            }
        })
        .await;

        match result {
            RetryResult::Success(text) => Ok(text),
            RetryResult::ExhaustedRetries {
                last_error,
                attempts,
            } => {
                tracing::error!(attempts, error = %last_error, "All generation attempts failed");
                Err(GenerationError::Exhausted {
                    attempts,
                    last: last_error.to_string(),
                })
            }
            RetryResult::PermanentError(e) => Err(e),
        }
    }
}

/// Single-prompt layout: instruction, optional context, message, answer cue.
pub fn folded_prompt(system: &str, prompt: &str, context: &str) -> String {
    if context.trim().is_empty() {
        format!("{system}\n\nUser message:\n{prompt}\n\nResponse:")
    } else {
        format!("{system}\n\nContext:\n{context}\n\nUser message:\n{prompt}\n\nResponse:")
    }
}

/// User turn for chat-style providers; the system prompt travels separately.
pub fn user_message(prompt: &str, context: &str) -> String {
    if context.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("Context:\n{context}\n\nUser message:\n{prompt}")
    }
}
