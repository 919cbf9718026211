//! Question generation for an evaluation run.
//!
//! Questions are produced in one batch per run, before the subject is
//! asked anything; generation never adapts to earlier answers.

use std::sync::Arc;

use async_trait::async_trait;
use personagym_llm::{CompletionRequest, TextGenerator};
use serde_json::Value;

use crate::domain::{EvalError, EvaluationConfig, Persona, Question, Result, TaskCategory};

/// Source of evaluation questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce exactly `config.num_questions` questions for `persona`.
    ///
    /// Question `i` targets [`TaskCategory::for_index(i)`](TaskCategory::for_index).
    async fn generate(&self, persona: &Persona, config: &EvaluationConfig)
        -> Result<Vec<Question>>;
}

// ---------------------------------------------------------------------------
// LLM-backed generation
// ---------------------------------------------------------------------------

/// Writes persona-specific questions with a language model.
pub struct LlmQuestionGenerator {
    generator: Arc<dyn TextGenerator>,
}

impl LlmQuestionGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn prompt(persona: &Persona, config: &EvaluationConfig) -> CompletionRequest {
        let plan: Vec<String> = (0..config.num_questions)
            .map(|i| {
                let task = TaskCategory::for_index(i);
                format!("{}. [{}] {}", i + 1, task, task.question_guidance())
            })
            .collect();

        let user = format!(
            "Persona: {persona}\n\
             Domain: {domain}\n\n\
             Write {n} questions to put to this persona, one per line of the plan below. \
             Each question must be answerable in character and specific to the persona \
             and the domain.\n\n\
             Plan:\n{plan}\n\n\
             Reply with a JSON array of exactly {n} strings, in plan order, and nothing else.",
            persona = persona,
            domain = config.domain,
            n = config.num_questions,
            plan = plan.join("\n"),
        );

        CompletionRequest::new(user)
            .with_system(
                "You design evaluation questions that test whether an agent stays \
                 consistent with an assigned persona.",
            )
            .with_temperature(0.7)
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(
        &self,
        persona: &Persona,
        config: &EvaluationConfig,
    ) -> Result<Vec<Question>> {
        let raw = self
            .generator
            .complete(&Self::prompt(persona, config))
            .await?;
        let texts = parse_question_list(&raw, config.num_questions)?;

        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Question::new(text, TaskCategory::for_index(i)))
            .collect())
    }
}

/// Extract exactly `expected` questions from a model reply.
///
/// Accepts a JSON array of strings or of objects carrying a `question` or
/// `text` field, optionally wrapped in prose or a code fence.
pub fn parse_question_list(raw: &str, expected: usize) -> Result<Vec<String>> {
    let malformed = |why: &str| {
        EvalError::Upstream(format!("question generator returned {}: {:?}", why, raw))
    };

    let start = raw.find('[').ok_or_else(|| malformed("no JSON array"))?;
    let end = raw.rfind(']').ok_or_else(|| malformed("no JSON array"))?;
    if end < start {
        return Err(malformed("no JSON array"));
    }

    let items: Vec<Value> =
        serde_json::from_str(&raw[start..=end]).map_err(|_| malformed("invalid JSON"))?;

    let questions: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map
                .get("question")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str),
            _ => None,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if questions.len() != expected {
        return Err(EvalError::Upstream(format!(
            "question generator returned {} questions, expected {}",
            questions.len(),
            expected
        )));
    }
    Ok(questions)
}

// ---------------------------------------------------------------------------
// Offline templates
// ---------------------------------------------------------------------------

const TEMPLATES: [&str; 5] = [
    "How would you introduce yourself?",
    "What is your professional background?",
    "How do you typically approach problem-solving?",
    "What are your key strengths?",
    "Describe a challenging situation you've handled.",
];

/// Fixed, persona-agnostic questions. Needs no model; the templates are
/// reused in order when more questions are requested than exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateQuestionGenerator;

#[async_trait]
impl QuestionGenerator for TemplateQuestionGenerator {
    async fn generate(
        &self,
        _persona: &Persona,
        config: &EvaluationConfig,
    ) -> Result<Vec<Question>> {
        Ok((0..config.num_questions)
            .map(|i| Question::new(TEMPLATES[i % TEMPLATES.len()], TaskCategory::for_index(i)))
            .collect())
    }
}
