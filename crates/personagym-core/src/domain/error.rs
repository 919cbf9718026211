//! Error taxonomy for PersonaGym evaluation runs.

use personagym_llm::LlmError;

/// PersonaGym domain errors.
///
/// Every variant is fatal to the evaluation run that produced it; there is
/// no partial credit.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("cannot reach {url}: {reason}")]
    Connectivity { url: String, reason: String },

    #[error("upstream service error: {0}")]
    Upstream(String),

    #[error("malformed score from scorer: {raw:?}")]
    MalformedScore { raw: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvalError {
    /// Build a connectivity error for `url`.
    pub fn connectivity(url: impl Into<String>, reason: impl ToString) -> Self {
        EvalError::Connectivity {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable kind, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::Connectivity { .. } => "connectivity_error",
            EvalError::Upstream(_) => "upstream_service_error",
            EvalError::MalformedScore { .. } => "malformed_score",
            EvalError::Configuration(_) => "configuration_error",
            EvalError::Llm(LlmError::MissingCredential(_) | LlmError::InvalidConfig(_)) => {
                "configuration_error"
            }
            EvalError::Llm(_) => "upstream_service_error",
            EvalError::Serialization(_) => "serialization_error",
            EvalError::Io(_) => "io_error",
        }
    }
}

/// Result type for PersonaGym domain operations.
pub type Result<T> = std::result::Result<T, EvalError>;
