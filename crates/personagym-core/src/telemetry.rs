//! Centralised tracing initialisation for PersonaGym binaries.
//!
//! Call [`init_tracing`] once at program start. Without `RUST_LOG`, the
//! PersonaGym crates and the HTTP trace layer log at the requested level
//! while every other dependency is held at `warn`.
//!
//! Later calls are ignored; the global subscriber can only be set once
//! per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const OWN_TARGETS: [&str; 4] = ["personagym", "personagym_core", "personagym_llm", "tower_http"];

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(OWN_TARGETS.iter().map(|target| format!("{}={}", target, level)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialise the global tracing subscriber.
///
/// `json` selects newline-delimited JSON lines over the human format;
/// `level` applies to the PersonaGym targets when `RUST_LOG` is unset.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let json_layer = json.then(|| fmt::layer().with_target(false).json());
    let text_layer = (!json).then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .ok();
}
