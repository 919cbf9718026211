//! Scenario files for local end-to-end runs.
//!
//! ```toml
//! [green_agent]
//! endpoint = "http://127.0.0.1:9009"
//! cmd = "personagym evaluator --port 9009"
//!
//! [[participants]]
//! role = "agent"
//! endpoint = "http://127.0.0.1:8001"
//! cmd = "personagym subject --port 8001"
//!
//! [config]
//! num_questions = 4
//! domain = "general"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{EvalError, EvaluationConfig, Result};
use crate::protocol::{normalize_base_url, EvalRequest, SUBJECT_ROLE};

/// An agent the runner may need to start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub endpoint: String,
    /// Shell command that starts the agent. `None` means it is already running.
    #[serde(default)]
    pub cmd: Option<String>,
}

/// A participant of the evaluation, identified by role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub role: String,
    pub endpoint: String,
    #[serde(default)]
    pub cmd: Option<String>,
}

/// A complete local evaluation setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub green_agent: AgentEndpoint,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub config: EvaluationConfig,
}

impl Scenario {
    /// Read and validate a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            EvalError::Configuration(msg) => {
                EvalError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(raw).map_err(|e| EvalError::Configuration(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check endpoints, the config, and that exactly one subject is listed.
    pub fn validate(&self) -> Result<()> {
        normalize_base_url(&self.green_agent.endpoint)?;
        for participant in &self.participants {
            normalize_base_url(&participant.endpoint)?;
        }

        let subjects = self
            .participants
            .iter()
            .filter(|p| p.role == SUBJECT_ROLE)
            .count();
        if subjects != 1 {
            return Err(EvalError::Configuration(format!(
                "scenario needs exactly one participant with role {:?}, found {}",
                SUBJECT_ROLE, subjects
            )));
        }

        self.config.validate()
    }

    /// The participant under evaluation.
    pub fn subject(&self) -> Result<&Participant> {
        self.participants
            .iter()
            .find(|p| p.role == SUBJECT_ROLE)
            .ok_or_else(|| {
                EvalError::Configuration(format!("missing participant role: {}", SUBJECT_ROLE))
            })
    }

    /// Request to send to the evaluator for this scenario.
    pub fn eval_request(&self) -> EvalRequest {
        let participants = self
            .participants
            .iter()
            .map(|p| (p.role.clone(), p.endpoint.clone()))
            .collect();
        EvalRequest {
            participants,
            config: self.config.clone(),
        }
    }

    /// Every agent with a start command, evaluator first.
    pub fn commands(&self) -> Vec<(String, &str, &str)> {
        let mut commands = Vec::new();
        if let Some(cmd) = self.green_agent.cmd.as_deref() {
            commands.push((
                "green_agent".to_string(),
                self.green_agent.endpoint.as_str(),
                cmd,
            ));
        }
        for p in &self.participants {
            if let Some(cmd) = p.cmd.as_deref() {
                commands.push((p.role.clone(), p.endpoint.as_str(), cmd));
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENARIO: &str = r#"
[green_agent]
endpoint = "http://127.0.0.1:9009"
cmd = "personagym evaluator --port 9009"

[[participants]]
role = "agent"
endpoint = "http://127.0.0.1:8001/"
cmd = "personagym subject --port 8001"

[config]
num_questions = 3
domain = "retail"
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        assert_eq!(scenario.green_agent.endpoint, "http://127.0.0.1:9009");
        assert_eq!(scenario.config.num_questions, 3);
        assert_eq!(scenario.config.domain, "retail");
        assert_eq!(scenario.subject().unwrap().endpoint, "http://127.0.0.1:8001/");

        let commands = scenario.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].0, "green_agent");
        assert_eq!(commands[1].0, "agent");
    }

    #[test]
    fn test_eval_request_from_scenario() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let request = scenario.eval_request();
        let (url, config) = request.validate().unwrap();
        assert_eq!(url, "http://127.0.0.1:8001");
        assert_eq!(config.num_questions, 3);
    }

    #[test]
    fn test_config_defaults_when_omitted() {
        let scenario = Scenario::from_toml_str(
            r#"
[green_agent]
endpoint = "http://127.0.0.1:9009"

[[participants]]
role = "agent"
endpoint = "http://127.0.0.1:8001"
"#,
        )
        .unwrap();
        assert_eq!(scenario.config, EvaluationConfig::default());
        assert!(scenario.commands().is_empty());
    }

    #[test]
    fn test_missing_subject_rejected() {
        let err = Scenario::from_toml_str(
            r#"
[green_agent]
endpoint = "http://127.0.0.1:9009"
"#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
    }

    #[test]
    fn test_zero_questions_rejected() {
        let raw = SCENARIO.replace("num_questions = 3", "num_questions = 0");
        assert!(matches!(
            Scenario::from_toml_str(&raw),
            Err(EvalError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.participants.len(), 1);

        let missing = Scenario::load(file.path().with_extension("missing")).unwrap_err();
        assert_eq!(missing.kind(), "io_error");
    }
}
