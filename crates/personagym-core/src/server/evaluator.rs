//! Routes for the evaluator agent.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::{EvalError, Result};
use crate::evaluator::Evaluator;
use crate::protocol::{AgentCard, EvalRequest, EvalResponse, HealthResponse, AGENT_CARD_PATH};

const AGENT_NAME: &str = "PersonaGymEvaluator";

/// Shared state for the evaluator routes.
#[derive(Clone)]
pub struct EvaluatorState {
    pub evaluator: Arc<Evaluator>,
    pub card: Arc<AgentCard>,
}

/// Build the evaluator agent's router.
///
/// `POST /` is an alias of `POST /evaluate`.
pub fn evaluator_router(evaluator: Arc<Evaluator>, card: AgentCard) -> Router {
    let state = EvaluatorState {
        evaluator,
        card: Arc::new(card),
    };

    Router::new()
        .route("/", post(evaluate))
        .route("/evaluate", post(evaluate))
        .route("/health", get(health))
        .route(AGENT_CARD_PATH, get(agent_card))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn evaluate(
    State(state): State<EvaluatorState>,
    payload: std::result::Result<Json<EvalRequest>, JsonRejection>,
) -> Result<Json<EvalResponse>> {
    let Json(request) = payload.map_err(|e| EvalError::Configuration(e.body_text()))?;
    let (subject_url, config) = request.validate()?;
    info!(subject = %subject_url, num_questions = config.num_questions, "evaluation requested");

    let report = state.evaluator.evaluate_address(&subject_url, config).await?;
    Ok(Json(EvalResponse::from(report)))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok(AGENT_NAME))
}

async fn agent_card(State(state): State<EvaluatorState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}
