//! Evaluator-side access to a subject agent.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Answer, EvalError, Persona, Question, Result};
use crate::protocol::{normalize_base_url, AnswerRequest, AnswerResponse, ProfileResponse};

/// How the evaluator talks to the agent under test.
#[async_trait]
pub trait SubjectClient: Send + Sync {
    /// Base address of the subject, for logs and errors.
    fn address(&self) -> &str;

    /// Fetch the persona the subject plays.
    async fn fetch_persona(&self) -> Result<Persona>;

    /// Ask one question and wait for the answer.
    async fn ask(&self, question: &Question) -> Result<Answer>;
}

/// Timeouts for calls to a subject agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectTimeouts {
    pub profile: Duration,
    pub answer: Duration,
}

impl Default for SubjectTimeouts {
    fn default() -> Self {
        Self {
            profile: Duration::from_secs(10),
            answer: Duration::from_secs(120),
        }
    }
}

/// [`SubjectClient`] over the subject's HTTP surface.
pub struct HttpSubjectClient {
    base_url: String,
    timeouts: SubjectTimeouts,
    http_client: reqwest::Client,
}

impl HttpSubjectClient {
    /// Create a client for the subject at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeouts(base_url, SubjectTimeouts::default())
    }

    pub fn with_timeouts(base_url: &str, timeouts: SubjectTimeouts) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("personagym-evaluator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EvalError::Configuration(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            timeouts,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SubjectClient for HttpSubjectClient {
    fn address(&self) -> &str {
        &self.base_url
    }

    async fn fetch_persona(&self) -> Result<Persona> {
        let url = self.url("/profile");
        debug!(url = %url, "fetching subject profile");

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeouts.profile)
            .send()
            .await
            .map_err(|e| EvalError::connectivity(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EvalError::connectivity(
                &url,
                format!("profile endpoint returned {}", status),
            ));
        }

        let profile: ProfileResponse = response
            .json()
            .await
            .map_err(|e| EvalError::connectivity(&url, format!("invalid profile: {}", e)))?;

        Persona::new(profile.persona)
            .map_err(|_| EvalError::connectivity(&url, "profile has an empty persona"))
    }

    async fn ask(&self, question: &Question) -> Result<Answer> {
        let url = self.url("/answer");
        let body = AnswerRequest {
            question: question.text.clone(),
        };

        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeouts.answer)
            .json(&body)
            .send()
            .await
            .map_err(|e| EvalError::connectivity(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EvalError::Upstream(format!(
                "subject at {} answered {}: {}",
                self.base_url, status, detail
            )));
        }

        let parsed: AnswerResponse = response.json().await.map_err(|e| {
            EvalError::Upstream(format!("subject at {} sent an invalid answer: {}", self.base_url, e))
        })?;

        Ok(Answer::new(parsed.answer))
    }
}
