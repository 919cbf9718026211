//! Wire contracts between the runner, the evaluator and the subject.
//!
//! Every payload is an explicit struct; requests from outside are validated
//! here before any work starts, and violations surface as
//! [`EvalError::Configuration`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{EvalError, EvaluationConfig, EvaluationReport, Persona, Result};

/// Participant role the subject agent must be registered under.
pub const SUBJECT_ROLE: &str = "agent";

/// Path of the agent card on both agents.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

// ---------------------------------------------------------------------------
// Subject agent
// ---------------------------------------------------------------------------

/// `GET /profile` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileResponse {
    #[serde(alias = "persona_description")]
    pub persona: String,
}

/// `POST /answer` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerRequest {
    pub question: String,
}

/// `POST /answer` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerResponse {
    pub answer: String,
}

// ---------------------------------------------------------------------------
// Evaluator agent
// ---------------------------------------------------------------------------

/// `POST /evaluate` request: who to evaluate and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvalRequest {
    /// Role name to base URL. Must contain [`SUBJECT_ROLE`].
    pub participants: BTreeMap<String, String>,
    #[serde(default)]
    pub config: EvaluationConfig,
}

impl EvalRequest {
    /// Request evaluating the subject at `subject_url`.
    pub fn new(subject_url: &str, config: EvaluationConfig) -> Self {
        let mut participants = BTreeMap::new();
        participants.insert(SUBJECT_ROLE.to_string(), subject_url.to_string());
        Self {
            participants,
            config,
        }
    }

    /// Check the request and return the subject's base URL with the config.
    pub fn validate(&self) -> Result<(String, EvaluationConfig)> {
        let raw = self.participants.get(SUBJECT_ROLE).ok_or_else(|| {
            EvalError::Configuration(format!("missing participant role: {}", SUBJECT_ROLE))
        })?;
        let subject_url = normalize_base_url(raw)?;
        self.config.validate()?;
        Ok((subject_url, self.config.clone()))
    }
}

/// Validate an agent base URL and strip trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| EvalError::Configuration(format!("invalid agent URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
        other => Err(EvalError::Configuration(format!(
            "unsupported URL scheme {:?} in {:?}",
            other, raw
        ))),
    }
}

/// `POST /evaluate` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalResponse {
    pub response: EvaluationReport,
    pub summary: String,
}

impl From<EvaluationReport> for EvalResponse {
    fn from(report: EvaluationReport) -> Self {
        let summary = report.summary();
        Self {
            response: report,
            summary,
        }
    }
}

/// Error body returned by both agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub agent: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok(agent: &str) -> Self {
        Self {
            status: "ok".to_string(),
            agent: agent.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Agent cards
// ---------------------------------------------------------------------------

/// Skill advertised on an agent card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
}

/// Optional protocol features an agent supports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentCapabilities {
    pub streaming: bool,
}

/// Self-description served at [`AGENT_CARD_PATH`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub capabilities: AgentCapabilities,
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Card for a subject agent playing `persona`.
    pub fn subject(url: &str, persona: &Persona) -> Self {
        Self {
            name: "personagym_white_agent".to_string(),
            description: format!("PersonaGym white agent: {}...", persona.preview(100)),
            url: url.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            default_input_modes: vec!["text/plain".to_string()],
            default_output_modes: vec!["text/plain".to_string()],
            capabilities: AgentCapabilities::default(),
            skills: vec![AgentSkill {
                id: "persona_qa".to_string(),
                name: "Persona Question Answering".to_string(),
                description:
                    "Answers questions while staying strictly in character according to a persona"
                        .to_string(),
                tags: vec!["benchmark".to_string(), "personagym".to_string()],
                examples: Vec::new(),
            }],
        }
    }

    /// Card for the evaluator agent.
    pub fn evaluator(url: &str) -> Self {
        let example = serde_json::json!({
            "participants": {"agent": "http://localhost:8001"},
            "config": {"num_questions": 4, "domain": "general"}
        })
        .to_string();

        Self {
            name: "PersonaGymEvaluator".to_string(),
            description: "PersonaGym evaluator - tests agents on persona consistency and quality"
                .to_string(),
            url: url.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            default_input_modes: vec!["application/json".to_string()],
            default_output_modes: vec!["application/json".to_string()],
            capabilities: AgentCapabilities::default(),
            skills: vec![AgentSkill {
                id: "personagym_evaluation".to_string(),
                name: "PersonaGym Evaluation".to_string(),
                description: "Evaluates white agents on persona consistency and quality"
                    .to_string(),
                tags: vec![
                    "benchmark".to_string(),
                    "evaluation".to_string(),
                    "personagym".to_string(),
                ],
                examples: vec![example],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_legacy_field() {
        let profile: ProfileResponse =
            serde_json::from_str(r#"{"persona_description": "A chef"}"#).unwrap();
        assert_eq!(profile.persona, "A chef");

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json, serde_json::json!({"persona": "A chef"}));
    }

    #[test]
    fn test_eval_request_wire_shape() {
        let raw = r#"{
            "participants": {"agent": "http://127.0.0.1:8001/"},
            "config": {"num_questions": 3, "domain": "travel"}
        }"#;
        let req: EvalRequest = serde_json::from_str(raw).unwrap();
        let (url, config) = req.validate().unwrap();

        assert_eq!(url, "http://127.0.0.1:8001");
        assert_eq!(config.num_questions, 3);
        assert_eq!(config.domain, "travel");
    }

    #[test]
    fn test_eval_request_config_defaults() {
        let req: EvalRequest =
            serde_json::from_str(r#"{"participants": {"agent": "http://localhost:8001"}}"#)
                .unwrap();
        let (_, config) = req.validate().unwrap();
        assert_eq!(config, EvaluationConfig::default());
    }

    #[test]
    fn test_eval_request_missing_agent_role() {
        let req: EvalRequest =
            serde_json::from_str(r#"{"participants": {"judge": "http://localhost:8001"}}"#)
                .unwrap();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, EvalError::Configuration(ref m) if m.contains("agent")));
    }

    #[test]
    fn test_eval_request_rejects_bad_urls() {
        let req = EvalRequest::new("not a url", EvaluationConfig::default());
        assert!(matches!(req.validate(), Err(EvalError::Configuration(_))));

        let req = EvalRequest::new("ftp://example.com", EvaluationConfig::default());
        assert!(matches!(req.validate(), Err(EvalError::Configuration(_))));
    }

    #[test]
    fn test_eval_request_rejects_zero_questions() {
        let config = EvaluationConfig {
            num_questions: 0,
            domain: "general".to_string(),
        };
        let req = EvalRequest::new("http://localhost:8001", config);
        assert!(matches!(req.validate(), Err(EvalError::Configuration(_))));
    }

    #[test]
    fn test_agent_card_uses_camel_case() {
        let persona = Persona::new("A lighthouse keeper").unwrap();
        let card = AgentCard::subject("http://localhost:8001/", &persona);
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(json["name"], "personagym_white_agent");
        assert_eq!(json["defaultInputModes"][0], "text/plain");
        assert_eq!(json["skills"][0]["id"], "persona_qa");
        assert!(json["description"]
            .as_str()
            .unwrap()
            .contains("A lighthouse keeper"));
    }

    #[test]
    fn test_evaluator_card_example_is_valid_request() {
        let card = AgentCard::evaluator("http://localhost:9009/");
        let example = &card.skills[0].examples[0];
        let req: EvalRequest = serde_json::from_str(example).unwrap();
        assert!(req.validate().is_ok());
    }
}
