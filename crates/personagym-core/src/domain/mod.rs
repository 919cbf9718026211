//! Domain models for PersonaGym.
//!
//! Canonical definitions for the core entities:
//! - `Persona`: the character a subject agent plays
//! - `EvaluationConfig`: parameters for one run
//! - `Question` / `Answer`: one exchange with the subject
//! - `EvaluationReport`: aggregated result of a run

pub mod config;
pub mod error;
pub mod persona;
pub mod question;
pub mod report;

// Re-export main types and errors
pub use config::{EvaluationConfig, DEFAULT_DOMAIN, DEFAULT_NUM_QUESTIONS};
pub use error::{EvalError, Result};
pub use persona::Persona;
pub use question::{Answer, Question, TaskCategory};
pub use report::{aggregate, EvaluationReport, ScoreSummary, ScoredEntry, MAX_SCORE, MIN_SCORE};
