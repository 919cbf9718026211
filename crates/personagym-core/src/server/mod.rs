//! HTTP surfaces of the two agents.
//!
//! - [`subject_router`]: `GET /profile`, `POST /answer`
//! - [`evaluator_router`]: `POST /evaluate` (also `POST /`)
//!
//! Both also serve `GET /health` and the agent card at
//! [`AGENT_CARD_PATH`](crate::protocol::AGENT_CARD_PATH). Errors are
//! rendered as [`ErrorBody`] JSON with a status derived from the error kind.

mod evaluator;
mod subject;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use personagym_llm::LlmError;
use tokio::net::TcpListener;
use tracing::info;

use crate::domain::{EvalError, Result};
use crate::protocol::ErrorBody;

pub use evaluator::{evaluator_router, EvaluatorState};
pub use subject::{subject_router, SubjectState};

impl EvalError {
    /// HTTP status used when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EvalError::Configuration(_)
            | EvalError::Llm(LlmError::MissingCredential(_) | LlmError::InvalidConfig(_)) => {
                StatusCode::BAD_REQUEST
            }
            EvalError::Connectivity { .. } => StatusCode::BAD_GATEWAY,
            EvalError::Upstream(_) | EvalError::MalformedScore { .. } | EvalError::Llm(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            EvalError::Serialization(_) | EvalError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EvalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Bind `addr` and serve `router` until Ctrl-C.
pub async fn serve(addr: &str, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            EvalError::Configuration("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EvalError::connectivity("http://x", "refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            EvalError::MalformedScore {
                raw: "?".to_string()
            }
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            EvalError::Llm(LlmError::Http("down".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_status_agrees_with_kind_for_model_configuration() {
        for err in [
            EvalError::Llm(LlmError::MissingCredential("OPENAI_API_KEY".to_string())),
            EvalError::Llm(LlmError::InvalidConfig("model must not be empty".to_string())),
        ] {
            assert_eq!(err.kind(), "configuration_error");
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }
}
