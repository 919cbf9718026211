//! Scored entries and the aggregated report of one evaluation run.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::TaskCategory;

/// Upper bound of the scoring scale.
pub const MAX_SCORE: f64 = 5.0;

/// Lower bound of the scoring scale.
pub const MIN_SCORE: f64 = 0.0;

/// One question, the answer it got, and the judgement of that answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredEntry {
    /// Position in issue order (0-based).
    pub index: usize,
    pub task_category: TaskCategory,
    pub question: String,
    pub answer: String,
    /// Score in `[0, 5]`.
    pub score: f64,
    /// Judge's explanation, when it gave one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Aggregated scores for a set of entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreSummary {
    /// Mean of the per-task scores.
    pub overall_score: f64,
    /// Mean score per task, in task order. Serialized keyed by display name.
    pub per_task_scores: BTreeMap<TaskCategory, f64>,
}

/// Average entry scores per task, then average the task means.
///
/// Weighting by task rather than by question keeps a task that received
/// more questions from dominating the overall score. An empty slice yields
/// an overall score of `0.0` and no tasks.
pub fn aggregate(entries: &[ScoredEntry]) -> ScoreSummary {
    let mut sums: BTreeMap<TaskCategory, (f64, usize)> = BTreeMap::new();
    for entry in entries {
        let slot = sums.entry(entry.task_category).or_insert((0.0, 0));
        slot.0 += entry.score;
        slot.1 += 1;
    }

    let per_task_scores: BTreeMap<TaskCategory, f64> = sums
        .into_iter()
        .map(|(task, (sum, count))| (task, sum / count as f64))
        .collect();

    let overall_score = if per_task_scores.is_empty() {
        0.0
    } else {
        per_task_scores.values().sum::<f64>() / per_task_scores.len() as f64
    };

    ScoreSummary {
        overall_score: overall_score.clamp(MIN_SCORE, MAX_SCORE),
        per_task_scores,
    }
}

/// Terminal artifact of one evaluation run.
///
/// # Invariants
///
/// `entries.len() == num_questions`, entries are in issue order, and
/// `overall_score` / `per_task_scores` are derived from `entries` via
/// [`aggregate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub persona: String,
    pub domain: String,
    pub num_questions: usize,
    pub overall_score: f64,
    pub per_task_scores: BTreeMap<TaskCategory, f64>,
    pub entries: Vec<ScoredEntry>,
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run, serialized as fractional seconds.
    #[serde(with = "duration_secs")]
    pub elapsed_time: Duration,
}

impl EvaluationReport {
    /// Build a report from scored entries, computing the aggregates.
    pub fn from_entries(
        run_id: Uuid,
        persona: &str,
        domain: &str,
        entries: Vec<ScoredEntry>,
        started_at: DateTime<Utc>,
        elapsed_time: Duration,
    ) -> Self {
        let summary = aggregate(&entries);
        Self {
            run_id,
            persona: persona.to_string(),
            domain: domain.to_string(),
            num_questions: entries.len(),
            overall_score: summary.overall_score,
            per_task_scores: summary.per_task_scores,
            entries,
            started_at,
            elapsed_time,
        }
    }

    /// Human-readable summary for operators.
    pub fn summary(&self) -> String {
        let persona_preview: String = self.persona.chars().take(100).collect();
        let task_lines: Vec<String> = self
            .per_task_scores
            .iter()
            .map(|(task, score)| format!("  {}: {:.2}", task, score))
            .collect();

        format!(
            "PersonaGym Evaluation Results\n\
             Persona: {}...\n\
             Overall Score: {:.2}/{:.1}\n\
             Questions: {}\n\
             Time: {:.1}s\n\
             \n\
             Task Scores:\n\
             {}",
            persona_preview,
            self.overall_score,
            MAX_SCORE,
            self.num_questions,
            self.elapsed_time.as_secs_f64(),
            task_lines.join("\n")
        )
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
