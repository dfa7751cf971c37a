//! Generation provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sampling options for one generation call.
///
/// Temperature is derived from the persona profile and kept stable per
/// persona so the shopkeeper's tone is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate. Kept small for concise answers.
    pub max_tokens: usize,
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Turns a composed prompt into free-text answer material.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the prompt. One call per question.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
