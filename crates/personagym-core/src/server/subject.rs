//! Routes for the subject agent.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::domain::{EvalError, Result};
use crate::protocol::{
    AgentCard, AnswerRequest, AnswerResponse, HealthResponse, ProfileResponse, AGENT_CARD_PATH,
};
use crate::subject::SubjectAgent;

const AGENT_NAME: &str = "personagym_white_agent";

/// Shared state for the subject routes.
#[derive(Clone)]
pub struct SubjectState {
    pub agent: Arc<SubjectAgent>,
    pub card: Arc<AgentCard>,
}

/// Build the subject agent's router.
pub fn subject_router(agent: Arc<SubjectAgent>, card: AgentCard) -> Router {
    let state = SubjectState {
        agent,
        card: Arc::new(card),
    };

    Router::new()
        .route("/profile", get(profile))
        .route("/answer", post(answer))
        .route("/health", get(health))
        .route(AGENT_CARD_PATH, get(agent_card))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn profile(State(state): State<SubjectState>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        persona: state.agent.persona().to_string(),
    })
}

async fn answer(
    State(state): State<SubjectState>,
    payload: std::result::Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>> {
    let Json(request) = payload.map_err(|e| EvalError::Configuration(e.body_text()))?;
    let answer = state.agent.answer(&request.question).await?;
    Ok(Json(AnswerResponse { answer: answer.text }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok(AGENT_NAME))
}

async fn agent_card(State(state): State<SubjectState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}
