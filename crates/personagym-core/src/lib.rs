//! PersonaGym Core Library
//!
//! Subject and evaluator agents for persona-consistency evaluation, plus the
//! HTTP surfaces and scenario files used to run them side by side.

pub mod client;
pub mod domain;
pub mod evaluator;
pub mod obs;
pub mod protocol;
pub mod questions;
pub mod scenario;
pub mod scoring;
pub mod server;
pub mod subject;
pub mod telemetry;

pub use client::{HttpSubjectClient, SubjectClient, SubjectTimeouts};

pub use domain::{
    aggregate, Answer, EvalError, EvaluationConfig, EvaluationReport, Persona, Question, Result,
    ScoreSummary, ScoredEntry, TaskCategory, DEFAULT_DOMAIN, DEFAULT_NUM_QUESTIONS, MAX_SCORE,
    MIN_SCORE,
};

pub use evaluator::Evaluator;

pub use protocol::{
    AgentCard, AnswerRequest, AnswerResponse, ErrorBody, EvalRequest, EvalResponse,
    HealthResponse, ProfileResponse, AGENT_CARD_PATH, SUBJECT_ROLE,
};

pub use questions::{LlmQuestionGenerator, QuestionGenerator, TemplateQuestionGenerator};

pub use scenario::{AgentEndpoint, Participant, Scenario};

pub use scoring::{HeuristicScorer, Judgement, LlmScorer, Scorer};

pub use server::{evaluator_router, serve, subject_router};

pub use subject::SubjectAgent;

pub use telemetry::init_tracing;
