//! PersonaGym-LLM: text generation for the PersonaGym agents
//!
//! Both agents lean on an external language model: the subject agent to
//! answer in character, the evaluator to write questions and to judge
//! answers. This crate hides that service behind the [`TextGenerator`]
//! trait and ships an OpenAI-compatible implementation plus in-memory fakes.
//!
//! ## Key Components
//!
//! - `TextGenerator`: async trait, one prompt in, one completion out
//! - `OpenAiClient`: chat-completions client configured from the environment
//! - `RetryPolicy`: timeout + exponential backoff around every call
//! - `fakes`: scripted generators for tests

mod error;
pub mod fakes;
mod openai;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::LlmError;
pub use openai::{OpenAiClient, OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use retry::{with_retry, RetryPolicy};

/// Result type for personagym-llm operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// A single prompt for a text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// User turn.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional cap on generated tokens.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request with a user prompt and deterministic sampling.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a completion for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model identifier, for logs and agent cards.
    fn model(&self) -> &str;
}
