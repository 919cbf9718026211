//! The character a subject agent role-plays.

use serde::{Deserialize, Serialize};

use super::error::{EvalError, Result};

/// Free-text persona description.
///
/// Set once when a subject agent starts and never mutated afterwards. The
/// inner string is private so a `Persona` is always non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Persona(String);

impl Persona {
    /// Validate and wrap a persona description.
    pub fn new(description: impl Into<String>) -> Result<Self> {
        let description = description.into();
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(EvalError::Configuration(
                "persona description must not be empty".to_string(),
            ));
        }
        Ok(Persona(trimmed.to_string()))
    }

    /// Full description.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// At most `max_chars` characters of the description, for logs and cards.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.0.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Persona {
    type Error = EvalError;

    fn try_from(s: String) -> Result<Self> {
        Persona::new(s)
    }
}

impl From<Persona> for String {
    fn from(persona: Persona) -> Self {
        persona.0
    }
}
