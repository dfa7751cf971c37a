//! Error taxonomy shared across the workspace
//!
//! Only `InvalidQuery` is ever surfaced to the caller as a distinct
//! error; every other variant is absorbed by the answering pipeline
//! and collapses into the fixed fallback answer.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied question text violates length/non-empty constraints.
    /// Surfaced to the caller as a validation message, never retried.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Embedding or vector-search call failed or timed out after retries.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Completion call failed or timed out after retries.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Prompt composition hit an impossible state. Treated as a bug:
    /// logged at error level and routed to the fallback answer.
    #[error("Composer error: {0}")]
    Composer(String),

    /// Configuration problem detected at startup.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a retry could plausibly succeed.
    ///
    /// Validation and composer errors are deterministic; provider
    /// failures may be transient (network, rate limiting).
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Retrieval(_) | Error::Generation(_))
    }
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
