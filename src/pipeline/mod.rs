pub mod types;
pub mod rules;
pub mod knowledge;
pub mod graph;
pub mod synthesis;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod mock;

use thiserror::Error;

/// The only error the pipeline surfaces to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriageError {
    #[error("Invalid input: {0}")]
    Validation(String),
}

/// A knowledge or graph source could not answer. Always absorbed by the
/// pipeline and treated as empty evidence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalFailure {
    #[error("Source not reachable at {0}")]
    Connection(String),

    #[error("Source returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed source response: {0}")]
    MalformedResponse(String),
}
