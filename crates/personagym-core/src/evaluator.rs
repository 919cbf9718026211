//! Evaluator ("green") agent: the question / answer / score pipeline.
//!
//! A run is strictly sequential:
//!
//! 1. fetch the persona from the subject
//! 2. generate all questions in one batch
//! 3. ask them one at a time, in order
//! 4. score every (question, answer) pair
//! 5. aggregate into an [`EvaluationReport`]
//!
//! The first failure aborts the run; nothing is salvaged from a partial run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{HttpSubjectClient, SubjectClient};
use crate::domain::{
    Answer, EvalError, EvaluationConfig, EvaluationReport, Question, Result, ScoredEntry,
};
use crate::obs;
use crate::questions::QuestionGenerator;
use crate::scoring::Scorer;
use crate::subject::preview;

/// Runs persona-consistency evaluations.
#[derive(Clone)]
pub struct Evaluator {
    questions: Arc<dyn QuestionGenerator>,
    scorer: Arc<dyn Scorer>,
}

impl Evaluator {
    pub fn new(questions: Arc<dyn QuestionGenerator>, scorer: Arc<dyn Scorer>) -> Self {
        Self { questions, scorer }
    }

    /// Evaluate the subject agent served at `subject_address`.
    pub async fn evaluate_address(
        &self,
        subject_address: &str,
        config: EvaluationConfig,
    ) -> Result<EvaluationReport> {
        let client = HttpSubjectClient::new(subject_address)?;
        self.evaluate(&client, config).await
    }

    /// Evaluate the subject behind `subject`.
    pub async fn evaluate(
        &self,
        subject: &dyn SubjectClient,
        config: EvaluationConfig,
    ) -> Result<EvaluationReport> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        let span = obs::eval_span(&run_id_str, subject.address());

        let result = self
            .run(run_id, subject, &config)
            .instrument(span.clone())
            .await;

        if let Err(err) = &result {
            let _guard = span.enter();
            obs::emit_evaluation_failed(&run_id_str, err.kind(), err);
        }
        result
    }

    async fn run(
        &self,
        run_id: Uuid,
        subject: &dyn SubjectClient,
        config: &EvaluationConfig,
    ) -> Result<EvaluationReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        obs::emit_evaluation_started(
            &run_id.to_string(),
            subject.address(),
            config.num_questions,
            &config.domain,
        );

        let persona = subject.fetch_persona().await?;
        obs::emit_persona_fetched(persona.preview(80));

        let questions = self.questions.generate(&persona, config).await?;
        if questions.len() != config.num_questions {
            return Err(EvalError::Upstream(format!(
                "question generator produced {} questions, expected {}",
                questions.len(),
                config.num_questions
            )));
        }
        obs::emit_questions_generated(questions.len());

        let mut pairs: Vec<(Question, Answer)> = Vec::with_capacity(questions.len());
        for (index, question) in questions.into_iter().enumerate() {
            tracing::debug!(question = %preview(&question.text, 50), "asking question");
            let answer = subject.ask(&question).await?;
            obs::emit_question_answered(
                index,
                config.num_questions,
                question.task_category.as_str(),
                answer.text.chars().count(),
            );
            pairs.push((question, answer));
        }

        let mut entries = Vec::with_capacity(pairs.len());
        for (index, (question, answer)) in pairs.into_iter().enumerate() {
            let judgement = self.scorer.score(&persona, &question, &answer).await?;
            obs::emit_answer_scored(index, question.task_category.as_str(), judgement.score);
            entries.push(ScoredEntry {
                index,
                task_category: question.task_category,
                question: question.text,
                answer: answer.text,
                score: judgement.score,
                rationale: judgement.rationale,
            });
        }

        let report = EvaluationReport::from_entries(
            run_id,
            persona.as_str(),
            &config.domain,
            entries,
            started_at,
            clock.elapsed(),
        );
        obs::emit_evaluation_finished(
            &run_id.to_string(),
            report.overall_score,
            report.num_questions,
            report.elapsed_time.as_millis() as u64,
        );
        Ok(report)
    }
}
