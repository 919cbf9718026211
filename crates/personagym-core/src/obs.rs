//! Structured observability hooks for the evaluation lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via [`eval_span`], to be attached with
//!   `tracing::Instrument` so it follows the run across `.await` points
//! - Emission functions for the key lifecycle events of a run
//!
//! Events are emitted at `info!` level (failures at `warn!`); filter with
//! `RUST_LOG` and select JSON output with the binaries' `--json` flag.

use tracing::{info, warn};

/// Span tagged with the run id and subject address.
pub fn eval_span(run_id: &str, subject: &str) -> tracing::Span {
    tracing::info_span!("personagym.eval", run_id = %run_id, subject = %subject)
}

/// Emit event: evaluation started.
pub fn emit_evaluation_started(run_id: &str, subject: &str, num_questions: usize, domain: &str) {
    info!(
        event = "evaluation.started",
        run_id = %run_id,
        subject = %subject,
        num_questions = num_questions,
        domain = %domain,
    );
}

/// Emit event: persona fetched from the subject.
pub fn emit_persona_fetched(persona_preview: &str) {
    info!(event = "persona.fetched", persona = %persona_preview);
}

/// Emit event: question batch generated.
pub fn emit_questions_generated(count: usize) {
    info!(event = "questions.generated", count = count);
}

/// Emit event: the subject answered question `index` (0-based).
pub fn emit_question_answered(index: usize, total: usize, task: &str, answer_chars: usize) {
    info!(
        event = "question.answered",
        question = index + 1,
        total = total,
        task = %task,
        answer_chars = answer_chars,
    );
}

/// Emit event: answer `index` (0-based) scored.
pub fn emit_answer_scored(index: usize, task: &str, score: f64) {
    info!(event = "answer.scored", question = index + 1, task = %task, score = score);
}

/// Emit event: evaluation finished with its overall score.
pub fn emit_evaluation_finished(run_id: &str, overall_score: f64, num_questions: usize, elapsed_ms: u64) {
    info!(
        event = "evaluation.finished",
        run_id = %run_id,
        overall_score = overall_score,
        num_questions = num_questions,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: evaluation aborted (warning level).
pub fn emit_evaluation_failed(run_id: &str, kind: &str, error: &dyn std::fmt::Display) {
    warn!(event = "evaluation.failed", run_id = %run_id, kind = %kind, error = %error);
}
