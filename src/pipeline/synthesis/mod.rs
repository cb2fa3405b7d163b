//! Generative synthesis: prompt assembly, one completion call, strict parse.

pub mod context;
pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod sanitize;
pub mod synthesizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ollama::OllamaChatClient;
pub use synthesizer::GenerativeSynthesizer;

/// Why the generative layer produced no usable result. Triggers the
/// fallback chain; never surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisFailure {
    #[error("Completion provider not reachable at {0}")]
    Connection(String),

    #[error("Completion provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Completion timed out after {0} ms")]
    Timeout(u64),

    #[error("Completion was empty")]
    EmptyResponse,

    #[error("Response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Response is missing field: {0}")]
    MissingField(&'static str),

    #[error("Unknown urgency level: {0}")]
    UnknownUrgency(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-style completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One completion over `messages`. Returns the assistant text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SynthesisFailure>;

    /// Backend reachable and the configured model present.
    async fn is_available(&self) -> bool;

    fn name(&self) -> &'static str;
}
