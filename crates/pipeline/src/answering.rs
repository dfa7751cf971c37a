//! End-to-end question answering
//!
//! One pipeline instance serves all requests concurrently. Per
//! question: retrieve context, compose the persona prompt, generate,
//! clamp. Retrieval or generation failure produces the fixed fallback
//! answer; only an invalid question surfaces as an error.

use std::sync::Arc;
use std::time::Duration;

use shop_assistant_config::{PersonaCatalog, PipelinePolicy, RetrievalConfig, RetryConfig};
use shop_assistant_core::{
    Answer, Error, GenerationProvider, Question, Result, ScoredChunk,
};
use shop_assistant_llm::PromptComposer;
use shop_assistant_rag::RetrievalOrchestrator;

use crate::retry::call_with_retry;

/// Where a question currently is in its journey. Used for tracing and
/// to label which stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Retrieving,
    Composing,
    Generating,
    Fallback,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Retrieving => "retrieving",
            Stage::Composing => "composing",
            Stage::Generating => "generating",
            Stage::Fallback => "fallback",
            Stage::Done => "done",
        }
    }
}

/// The full question-to-answer pipeline
pub struct AnsweringPipeline {
    retriever: RetrievalOrchestrator,
    composer: PromptComposer,
    generator: Arc<dyn GenerationProvider>,
    personas: PersonaCatalog,
    retrieval: RetrievalConfig,
    policy: PipelinePolicy,
    retry: RetryConfig,
    max_answer_chars: usize,
}

impl AnsweringPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        retriever: RetrievalOrchestrator,
        composer: PromptComposer,
        generator: Arc<dyn GenerationProvider>,
        personas: PersonaCatalog,
        retrieval: RetrievalConfig,
        policy: PipelinePolicy,
        retry: RetryConfig,
        max_answer_chars: usize,
    ) -> Self {
        Self {
            retriever,
            composer,
            generator,
            personas,
            retrieval,
            policy,
            retry,
            max_answer_chars,
        }
    }

    /// Answer one question.
    ///
    /// Returns `Err` only for an invalid question (blank or over the
    /// length limit); every other failure becomes `Ok` with the
    /// fallback answer so the shop never goes silent.
    pub async fn answer(&self, question: &Question) -> Result<Answer> {
        let context = match self.retrieve_stage(question).await {
            Ok(context) => context,
            Err(Error::InvalidQuery(msg)) => {
                metrics::counter!("shop_invalid_queries_total").increment(1);
                return Err(Error::InvalidQuery(msg));
            },
            Err(err) => {
                if self.policy.generate_without_context {
                    tracing::warn!(error = %err, "retrieval failed, generating without context");
                    Vec::new()
                } else {
                    tracing::warn!(
                        stage = Stage::Retrieving.as_str(),
                        error = %err,
                        "retrieval failed, returning fallback"
                    );
                    return Ok(self.fallback());
                }
            },
        };

        let persona = self.personas.profile_for(question.customer_type());
        let prompt = self.composer.compose(question, persona, &context);
        tracing::debug!(
            stage = Stage::Composing.as_str(),
            customer_type = question.customer_type().as_tag(),
            chunks_used = prompt.chunks_used,
            prompt_chars = prompt.text.chars().count(),
            "prompt composed"
        );

        let generated = call_with_retry(
            "generate",
            Duration::from_millis(self.retry.generate_timeout_ms),
            self.retry.max_retries,
            Duration::from_millis(self.retry.initial_backoff_ms),
            Error::Generation,
            || self.generator.generate(&prompt.text, &prompt.options),
        )
        .await;

        match generated {
            Ok(text) => {
                metrics::counter!("shop_answers_total", "outcome" => "generated").increment(1);
                tracing::info!(
                    stage = Stage::Done.as_str(),
                    customer_type = question.customer_type().as_tag(),
                    chunks_used = prompt.chunks_used,
                    "answer generated"
                );
                Ok(Answer::generated(&text, self.max_answer_chars))
            },
            Err(err) => {
                tracing::warn!(
                    stage = Stage::Generating.as_str(),
                    error = %err,
                    "generation failed, returning fallback"
                );
                Ok(self.fallback())
            },
        }
    }

    async fn retrieve_stage(&self, question: &Question) -> Result<Vec<ScoredChunk>> {
        // The orchestrator bounds each provider call on its own; this
        // window caps the whole attempt as a backstop.
        let timeout =
            Duration::from_millis(self.retry.embed_timeout_ms + self.retry.search_timeout_ms);

        call_with_retry(
            "retrieve",
            timeout,
            self.retry.max_retries,
            Duration::from_millis(self.retry.initial_backoff_ms),
            Error::Retrieval,
            || {
                self.retriever.retrieve(
                    question.text(),
                    self.retrieval.top_k,
                    self.retrieval.min_score,
                )
            },
        )
        .await
    }

    fn fallback(&self) -> Answer {
        metrics::counter!("shop_answers_total", "outcome" => "fallback").increment(1);
        Answer::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Retrieving.as_str(), "retrieving");
        assert_eq!(Stage::Fallback.as_str(), "fallback");
    }
}
