//! Error types for personagym-llm

use thiserror::Error;

/// Errors that can occur while talking to a text-generation service
#[derive(Error, Debug)]
pub enum LlmError {
    /// API credential not present in the environment
    #[error("credential not configured: set {0}")]
    MissingCredential(String),

    /// Invalid client configuration
    #[error("invalid LLM configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure (connect, TLS, broken body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request did not complete within the allotted time
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The service answered with a non-success status
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but produced no text
    #[error("empty completion from model {model}")]
    EmptyCompletion { model: String },

    /// Response body could not be decoded
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl LlmError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Transport failures, timeouts, rate limiting and 5xx responses are
    /// transient. Everything else is a property of the request or of the
    /// configuration and will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Timeout(_) => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::MissingCredential(_)
            | LlmError::InvalidConfig(_)
            | LlmError::EmptyCompletion { .. }
            | LlmError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Decode(err.to_string())
    }
}
