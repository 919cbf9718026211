//! Parameters for one evaluation run.

use serde::{Deserialize, Serialize};

use super::error::{EvalError, Result};

/// Questions asked when a request does not say.
pub const DEFAULT_NUM_QUESTIONS: usize = 4;

/// Domain used when a request does not say.
pub const DEFAULT_DOMAIN: &str = "general";

/// Configuration for a single evaluation run.
///
/// Omitted fields take their defaults on deserialization; call
/// [`EvaluationConfig::validate`] before using a config received from the
/// outside world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// How many questions to ask. Must be positive.
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,

    /// Topic area the questions should come from (open set, e.g. "general").
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_num_questions() -> usize {
    DEFAULT_NUM_QUESTIONS
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_NUM_QUESTIONS,
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

impl EvaluationConfig {
    /// Create a validated config.
    pub fn new(num_questions: usize, domain: &str) -> Result<Self> {
        let config = Self {
            num_questions,
            domain: domain.trim().to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no run can satisfy.
    ///
    /// A run with zero questions has no scores to average, so it is refused
    /// up front instead of producing an undefined overall score.
    pub fn validate(&self) -> Result<()> {
        if self.num_questions == 0 {
            return Err(EvalError::Configuration(
                "num_questions must be at least 1".to_string(),
            ));
        }
        if self.domain.trim().is_empty() {
            return Err(EvalError::Configuration(
                "domain must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
