//! Subject ("white") agent: answers questions in character.

use std::sync::Arc;

use personagym_llm::{CompletionRequest, TextGenerator};
use tracing::{debug, info};

use crate::domain::{Answer, EvalError, Persona, Result};

/// Persona-conditioned question answering.
///
/// Holds the persona it was started with and nothing else; every call is
/// independent of the previous ones.
pub struct SubjectAgent {
    persona: Persona,
    generator: Arc<dyn TextGenerator>,
}

impl SubjectAgent {
    pub fn new(persona: Persona, generator: Arc<dyn TextGenerator>) -> Self {
        info!(persona = %persona.preview(50), model = %generator.model(), "subject agent ready");
        Self { persona, generator }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Instruction given to the model ahead of every question.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are acting as: {}. You must answer the following question while staying \
             strictly in character.",
            self.persona
        )
    }

    /// Answer `question` in character with one generation call.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EvalError::Configuration(
                "no question text was provided".to_string(),
            ));
        }

        debug!(question = %preview(question, 100), "answering question");
        let request = CompletionRequest::new(question)
            .with_system(self.system_prompt())
            .with_temperature(0.0);
        let text = self.generator.complete(&request).await?;
        debug!(answer = %preview(&text, 100), "answer generated");

        Ok(Answer::new(text))
    }
}

pub(crate) fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
