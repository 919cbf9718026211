//! PersonaGym CLI
//!
//! The `personagym` command runs the agents of a persona-consistency
//! evaluation.
//!
//! ## Commands
//!
//! - `subject`: serve a subject agent that answers in character
//! - `evaluator`: serve the evaluator agent
//! - `run`: start both from a scenario file and run one evaluation

mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use personagym_core::{
    evaluator_router, serve, subject_router, AgentCard, Evaluator, HeuristicScorer,
    LlmQuestionGenerator, LlmScorer, Persona, QuestionGenerator, Scorer, SubjectAgent,
    TemplateQuestionGenerator,
};
use personagym_llm::{
    OpenAiClient, OpenAiConfig, RetryPolicy, TextGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
use tracing::{info, Level};

use runner::{RunOptions, DEFAULT_READY_TIMEOUT};

const DEFAULT_PERSONA: &str = "A 29-year-old Muslim woman from Malaysia, working as a software \
                               developer and advocating for women in STEM fields";

#[derive(Parser)]
#[command(name = "personagym")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PersonaGym persona-consistency evaluation agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a subject agent that answers questions in character
    Subject {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 8001)]
        port: u16,

        /// Persona the agent plays for its whole lifetime
        #[arg(long, env = "PERSONAGYM_PERSONA", default_value = DEFAULT_PERSONA)]
        persona: String,

        /// URL advertised on the agent card (default: http://<host>:<port>)
        #[arg(long)]
        card_url: Option<String>,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Serve the evaluator agent
    Evaluator {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 9009)]
        port: u16,

        /// URL advertised on the agent card (default: http://<host>:<port>)
        #[arg(long)]
        card_url: Option<String>,

        /// How questions are produced
        #[arg(long, value_enum, default_value_t = QuestionMode::Llm)]
        questions: QuestionMode,

        /// How answers are scored
        #[arg(long, value_enum, default_value_t = ScorerMode::Llm)]
        scorer: ScorerMode,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Start the agents of a scenario and run one evaluation
    Run {
        /// Path to the scenario TOML file
        scenario: PathBuf,

        /// Show the agents' stdout/stderr
        #[arg(long)]
        show_logs: bool,

        /// Start the agents and wait for Ctrl-C without evaluating
        #[arg(long)]
        serve_only: bool,

        /// Seconds to wait for every agent to become healthy
        #[arg(long, default_value_t = DEFAULT_READY_TIMEOUT.as_secs())]
        ready_timeout_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QuestionMode {
    /// Persona-specific questions written by the model
    Llm,
    /// Fixed built-in questions
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScorerMode {
    /// Rubric scoring with the model as judge
    Llm,
    /// Offline length heuristic
    Heuristic,
}

/// Language model settings shared by the agent commands.
#[derive(Args, Debug, Clone)]
struct LlmArgs {
    /// Chat model name
    #[arg(long, env = "PERSONAGYM_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API key for the OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Retries for transient model failures
    #[arg(long, default_value_t = 2)]
    max_retries: u32,

    /// Base delay between retries, doubled on every attempt
    #[arg(long, default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Timeout for a single model call
    #[arg(long, default_value_t = 60_000)]
    llm_timeout_ms: u64,
}

impl LlmArgs {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_backoff_base_ms(self.retry_backoff_ms)
            .with_timeout_ms(self.llm_timeout_ms)
    }

    fn build(&self) -> Result<Arc<dyn TextGenerator>> {
        let api_key = self.api_key.as_deref().unwrap_or_default();
        let config = OpenAiConfig::new(api_key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_retry(self.retry_policy());
        let client = OpenAiClient::new(config).context("Failed to configure language model")?;
        Ok(Arc::new(client))
    }
}

fn card_url(card_url: Option<String>, host: &str, port: u16) -> String {
    card_url.unwrap_or_else(|| format!("http://{}:{}", host, port))
}

async fn cmd_subject(
    host: &str,
    port: u16,
    persona: &str,
    card_url: String,
    llm: &LlmArgs,
) -> Result<()> {
    let persona = Persona::new(persona).context("Invalid persona")?;
    let generator = llm.build()?;
    let card = AgentCard::subject(&card_url, &persona);
    let agent = SubjectAgent::new(persona, generator);

    let addr = format!("{}:{}", host, port);
    info!(addr = %addr, card_url = %card_url, "starting subject agent");
    serve(&addr, subject_router(Arc::new(agent), card))
        .await
        .context("Subject agent server failed")
}

async fn cmd_evaluator(
    host: &str,
    port: u16,
    card_url: String,
    questions: QuestionMode,
    scorer: ScorerMode,
    llm: &LlmArgs,
) -> Result<()> {
    let needs_model = questions == QuestionMode::Llm || scorer == ScorerMode::Llm;
    let generator = if needs_model { Some(llm.build()?) } else { None };

    let question_source: Arc<dyn QuestionGenerator> = match (questions, &generator) {
        (QuestionMode::Llm, Some(gen)) => Arc::new(LlmQuestionGenerator::new(gen.clone())),
        _ => Arc::new(TemplateQuestionGenerator),
    };
    let judge: Arc<dyn Scorer> = match (scorer, &generator) {
        (ScorerMode::Llm, Some(gen)) => Arc::new(LlmScorer::new(gen.clone())),
        _ => Arc::new(HeuristicScorer),
    };
    let evaluator = Evaluator::new(question_source, judge);

    let addr = format!("{}:{}", host, port);
    info!(
        addr = %addr,
        questions = ?questions,
        scorer = ?scorer,
        "starting evaluator agent"
    );
    serve(
        &addr,
        evaluator_router(Arc::new(evaluator), AgentCard::evaluator(&card_url)),
    )
    .await
    .context("Evaluator agent server failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    personagym_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Subject {
            host,
            port,
            persona,
            card_url: url,
            llm,
        } => {
            let url = card_url(url, &host, port);
            cmd_subject(&host, port, &persona, url, &llm).await
        }
        Commands::Evaluator {
            host,
            port,
            card_url: url,
            questions,
            scorer,
            llm,
        } => {
            let url = card_url(url, &host, port);
            cmd_evaluator(&host, port, url, questions, scorer, &llm).await
        }
        Commands::Run {
            scenario,
            show_logs,
            serve_only,
            ready_timeout_secs,
        } => {
            let options = RunOptions {
                show_logs,
                serve_only,
                ready_timeout: std::time::Duration::from_secs(ready_timeout_secs),
            };
            runner::run_scenario(&scenario, options).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subject_defaults() {
        let cli = Cli::try_parse_from(["personagym", "subject"]).unwrap();
        match cli.command {
            Commands::Subject {
                host, port, llm, ..
            } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8001);
                assert_eq!(llm.max_retries, 2);
                assert_eq!(llm.retry_backoff_ms, 500);
            }
            _ => panic!("expected subject command"),
        }
    }

    #[test]
    fn test_evaluator_offline_modes() {
        let cli = Cli::try_parse_from([
            "personagym",
            "--json",
            "evaluator",
            "--questions",
            "template",
            "--scorer",
            "heuristic",
            "--port",
            "9100",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Evaluator {
                host,
                port,
                questions,
                scorer,
                ..
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 9100);
                assert_eq!(questions, QuestionMode::Template);
                assert_eq!(scorer, ScorerMode::Heuristic);
            }
            _ => panic!("expected evaluator command"),
        }
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "personagym",
            "run",
            "scenarios/personagym/scenario.toml",
            "--serve-only",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                scenario,
                show_logs,
                serve_only,
                ready_timeout_secs,
            } => {
                assert_eq!(scenario, PathBuf::from("scenarios/personagym/scenario.toml"));
                assert!(!show_logs);
                assert!(serve_only);
                assert_eq!(ready_timeout_secs, 30);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let args = LlmArgs {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 0,
            retry_backoff_ms: 0,
            llm_timeout_ms: 1000,
        };
        let err = args.build().err().expect("missing key must fail");
        assert!(format!("{:#}", err).contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_card_url_defaults_to_bind_address() {
        assert_eq!(card_url(None, "127.0.0.1", 9009), "http://127.0.0.1:9009");
        assert_eq!(
            card_url(Some("https://eval.example.org".to_string()), "0.0.0.0", 9009),
            "https://eval.example.org"
        );
    }
}
