//! Generation providers and prompt composition
//!
//! `ClaudeBackend` talks to the Anthropic Messages API and is the
//! production `GenerationProvider`. `ScriptedGenerator` is the test
//! stub. `PromptComposer` turns a question, its retrieved context,
//! and a persona profile into the single prompt sent to the provider.

pub mod claude;
pub mod prompt;
pub mod scripted;

pub use claude::{ClaudeBackend, ClaudeConfig};
pub use prompt::{ComposedPrompt, PromptComposer};
pub use scripted::ScriptedGenerator;

use thiserror::Error;

/// Generation-side errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for shop_assistant_core::Error {
    fn from(err: LlmError) -> Self {
        shop_assistant_core::Error::Generation(err.to_string())
    }
}
