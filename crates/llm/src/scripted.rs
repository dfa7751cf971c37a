//! Scripted generation stub
//!
//! Returns queued responses in order, or a configured error. Used by
//! the pipeline tests and for provider-less local development.

use async_trait::async_trait;
use parking_lot::Mutex;

use shop_assistant_core::{Error, GenerationOptions, GenerationProvider, Result};

/// Test double for `GenerationProvider`
pub struct ScriptedGenerator {
    responses: Mutex<Vec<String>>,
    fail_with: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Responds with each script entry in turn, then repeats the last.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Every call fails with a generation error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.calls.lock().push(prompt.to_string());

        if let Some(ref message) = self.fail_with {
            return Err(Error::Generation(message.clone()));
        }

        let mut responses = self.responses.lock();
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else {
            responses
                .first()
                .cloned()
                .ok_or_else(|| Error::Generation("script exhausted".to_string()))
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let gen = ScriptedGenerator::new(vec!["first".to_string(), "second".to_string()]);
        let opts = GenerationOptions::default();

        assert_eq!(gen.generate("a", &opts).await.unwrap(), "first");
        assert_eq!(gen.generate("b", &opts).await.unwrap(), "second");
        // Last entry repeats.
        assert_eq!(gen.generate("c", &opts).await.unwrap(), "second");
        assert_eq!(gen.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_generator() {
        let gen = ScriptedGenerator::failing("till's down");
        let err = gen
            .generate("a", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
