//! Judging answers for persona consistency.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use personagym_llm::{CompletionRequest, TextGenerator};
use regex::Regex;
use serde_json::Value;

use crate::domain::{Answer, EvalError, Persona, Question, Result, MAX_SCORE, MIN_SCORE};

/// A judge's verdict on one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    /// Score in `[0, 5]`.
    pub score: f64,
    pub rationale: Option<String>,
}

/// Scores one (question, answer) pair against the persona.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        persona: &Persona,
        question: &Question,
        answer: &Answer,
    ) -> Result<Judgement>;
}

// ---------------------------------------------------------------------------
// LLM judge
// ---------------------------------------------------------------------------

/// Rubric-based scoring with a language model as the judge.
pub struct LlmScorer {
    generator: Arc<dyn TextGenerator>,
}

impl LlmScorer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn prompt(persona: &Persona, question: &Question, answer: &Answer) -> CompletionRequest {
        let user = format!(
            "Persona: {persona}\n\
             Task: {task}\n\
             Rubric: {rubric}\n\n\
             Question: {question}\n\
             Answer: {answer}\n\n\
             Score the answer from 0 to 5 using the rubric. Reply with JSON only: \
             {{\"score\": <number between 0 and 5>, \"rationale\": \"<one sentence>\"}}",
            persona = persona,
            task = question.task_category,
            rubric = question.task_category.rubric(),
            question = question.text,
            answer = answer.text,
        );

        CompletionRequest::new(user)
            .with_system(
                "You are a strict evaluator judging whether an agent's answer is \
                 consistent with its assigned persona.",
            )
            .with_temperature(0.0)
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(
        &self,
        persona: &Persona,
        question: &Question,
        answer: &Answer,
    ) -> Result<Judgement> {
        let raw = self
            .generator
            .complete(&Self::prompt(persona, question, answer))
            .await?;
        parse_judgement(&raw)
    }
}

fn score_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bscore\b[^\w\-]{0,4}(-?\d+(?:\.\d+)?)").expect("score pattern is valid")
    })
}

/// Parse a judge reply into a bounded [`Judgement`].
///
/// A reply carrying a JSON object with a `score` key is judged on that key
/// alone: a numeric (or numeric-string) value is accepted, anything else is
/// malformed. Replies without such an object fall back to a `Score: <n>`
/// line, then a bare number. Any score outside `[0, 5]` is
/// [`EvalError::MalformedScore`].
pub fn parse_judgement(raw: &str) -> Result<Judgement> {
    let malformed = || EvalError::MalformedScore {
        raw: raw.to_string(),
    };

    let judgement = match judgement_from_json(raw) {
        Some(found) => found,
        None => score_from_text(raw).map(|score| Judgement {
            score,
            rationale: None,
        }),
    }
    .ok_or_else(malformed)?;

    if !judgement.score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&judgement.score) {
        return Err(malformed());
    }
    Ok(judgement)
}

/// `None` when the reply holds no JSON object with a `score` key;
/// `Some(None)` when it does but the score is not a number.
fn judgement_from_json(raw: &str) -> Option<Option<Judgement>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;

    let score = match value.get("score")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    let rationale = value
        .get("rationale")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(score.map(|score| Judgement { score, rationale }))
}

fn score_from_text(raw: &str) -> Option<f64> {
    score_line_pattern()
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .or_else(|| raw.trim().parse::<f64>().ok())
}

// ---------------------------------------------------------------------------
// Offline heuristic
// ---------------------------------------------------------------------------

/// Length-based scoring that needs no model.
///
/// Answers that start with `Error` score 0; everything else scores one point
/// per 50 characters, clamped to `[1, 5]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

#[async_trait]
impl Scorer for HeuristicScorer {
    async fn score(
        &self,
        _persona: &Persona,
        _question: &Question,
        answer: &Answer,
    ) -> Result<Judgement> {
        let text = answer.text.trim();
        let score = if text.is_empty() || text.starts_with("Error") {
            MIN_SCORE
        } else {
            (text.chars().count() as f64 / 50.0).clamp(1.0, MAX_SCORE)
        };
        Ok(Judgement {
            score,
            rationale: Some("length heuristic".to_string()),
        })
    }
}
