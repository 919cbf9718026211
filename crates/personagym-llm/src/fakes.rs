//! In-memory fakes for `TextGenerator` (testing only)
//!
//! Provides `ScriptedGenerator` and `FailingGenerator`, which satisfy the
//! trait contract without any network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::{CompletionRequest, Result, TextGenerator};

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// Generator whose output is decided by a closure, recording every request.
pub struct ScriptedGenerator {
    model: String,
    responder: Responder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    /// Answer every request with the same text.
    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_| Ok(text.clone()))
    }

    /// Answer requests with `responses` in order, cycling when exhausted.
    pub fn from_responses(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "scripted responses must not be empty");
        let cursor = AtomicUsize::new(0);
        Self::from_fn(move |_| {
            let n = cursor.fetch_add(1, Ordering::SeqCst);
            Ok(responses[n % responses.len()].clone())
        })
    }

    /// Decide each answer with `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            model: "scripted".to_string(),
            responder: Box::new(f),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// FailingGenerator
// ---------------------------------------------------------------------------

/// Generator that fails every call with a fixed HTTP status.
#[derive(Debug)]
pub struct FailingGenerator {
    status: u16,
    calls: AtomicUsize,
}

impl FailingGenerator {
    /// Fail with `503 Service Unavailable`.
    pub fn new() -> Self {
        Self::with_status(503)
    }

    /// Fail with the given status code.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Status {
            status: self.status,
            body: "scripted failure".to_string(),
        })
    }

    fn model(&self) -> &str {
        "failing"
    }
}
