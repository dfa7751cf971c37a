//! End-to-end pipeline tests with stub providers

use std::sync::Arc;

use async_trait::async_trait;

use shop_assistant_config::{
    PersonaCatalog, PipelinePolicy, PromptBudget, RetrievalConfig, RetryConfig,
};
use shop_assistant_core::{
    CustomerType, EmbeddingProvider, Error, IndexHit, KnowledgeChunk, Question, Result,
    VectorIndex, FALLBACK_ANSWER,
};
use shop_assistant_llm::{PromptComposer, ScriptedGenerator};
use shop_assistant_pipeline::AnsweringPipeline;
use shop_assistant_rag::{HashEmbedder, InMemoryIndex, RetrievalOrchestrator};

const SHOP_CORPUS: &[(&str, &str)] = &[
    (
        "eggs",
        "Fresh eggs come from the Hendersons' farm up the lane, collected every morning.",
    ),
    (
        "milk",
        "Milk is delivered by the local dairy on Tuesday and Friday mornings.",
    ),
    (
        "payment",
        "Payment goes in the honesty box by the door, cash only, coins or notes.",
    ),
];

async fn seeded_index(embedder: &HashEmbedder) -> InMemoryIndex {
    let index = InMemoryIndex::new();
    let mut chunks = Vec::new();
    for (id, text) in SHOP_CORPUS {
        let embedding = embedder.embed(text).await.unwrap();
        chunks.push(KnowledgeChunk::new(*id, *text).with_embedding(embedding));
    }
    index.upsert(chunks);
    index
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        initial_backoff_ms: 1,
        embed_timeout_ms: 1000,
        search_timeout_ms: 1000,
        generate_timeout_ms: 1000,
    }
}

fn build_pipeline(
    index: Arc<dyn VectorIndex>,
    generator: Arc<ScriptedGenerator>,
    policy: PipelinePolicy,
) -> AnsweringPipeline {
    let embedder = Arc::new(HashEmbedder::new(64));
    let retriever = RetrievalOrchestrator::new(embedder, index);
    let composer = PromptComposer::new(PromptBudget::default(), 300);

    AnsweringPipeline::new(
        retriever,
        composer,
        generator,
        PersonaCatalog::default_catalog(),
        RetrievalConfig {
            top_k: 4,
            min_score: 0.0,
        },
        policy,
        fast_retry(),
        1200,
    )
}

struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn search(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<IndexHit>> {
        Err(Error::Retrieval("qdrant unreachable".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn test_eggs_question_answered_from_corpus() {
    let embedder = HashEmbedder::new(64);
    let index = seeded_index(&embedder).await;
    let generator = Arc::new(ScriptedGenerator::with_response(
        "Lovely fresh eggs from the Hendersons' farm, collected this morning!",
    ));

    let pipeline = build_pipeline(
        Arc::new(index),
        generator.clone(),
        PipelinePolicy::default(),
    );

    let question =
        Question::new("Where do the fresh eggs come from?", CustomerType::General).unwrap();
    let answer = pipeline.answer(&question).await.unwrap();

    assert!(!answer.is_fallback());
    assert!(answer.text().contains("Hendersons"));

    // The generator saw the retrieved context and the verbatim question.
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Hendersons' farm"));
    assert!(prompts[0].contains("Customer asks: Where do the fresh eggs come from?"));
}

#[tokio::test]
async fn test_blank_question_is_rejected_without_provider_calls() {
    let generator = Arc::new(ScriptedGenerator::with_response("never used"));
    let _pipeline = build_pipeline(
        Arc::new(InMemoryIndex::new()),
        generator.clone(),
        PipelinePolicy::default(),
    );

    let err = Question::new("   \n  ", CustomerType::General).unwrap_err();
    assert!(matches!(err, Error::InvalidQuery(_)));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_index_failure_returns_fallback_without_generation() {
    let generator = Arc::new(ScriptedGenerator::with_response("never used"));
    let pipeline = build_pipeline(
        Arc::new(FailingIndex),
        generator.clone(),
        PipelinePolicy::default(),
    );

    let question = Question::new("Do you have milk?", CustomerType::General).unwrap();
    let answer = pipeline.answer(&question).await.unwrap();

    assert!(answer.is_fallback());
    assert_eq!(answer.text(), FALLBACK_ANSWER);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_returns_exact_fallback() {
    let embedder = HashEmbedder::new(64);
    let index = seeded_index(&embedder).await;
    let generator = Arc::new(ScriptedGenerator::failing("api overloaded"));

    let pipeline = build_pipeline(
        Arc::new(index),
        generator,
        PipelinePolicy::default(),
    );

    let question = Question::new("Do you have milk?", CustomerType::Returning).unwrap();
    let answer = pipeline.answer(&question).await.unwrap();

    assert_eq!(answer.text(), FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_unknown_customer_tag_gets_valid_answer() {
    let embedder = HashEmbedder::new(64);
    let index = seeded_index(&embedder).await;
    let generator = Arc::new(ScriptedGenerator::with_response(
        "Pop your money in the box, whatever suits!",
    ));

    let pipeline = build_pipeline(
        Arc::new(index),
        generator,
        PipelinePolicy::default(),
    );

    // Unrecognized tags fold into the general persona.
    let customer = CustomerType::from_tag("mystery-shopper");
    assert_eq!(customer, CustomerType::General);

    let question = Question::new("How do I pay?", customer).unwrap();
    let answer = pipeline.answer(&question).await.unwrap();
    assert!(!answer.is_fallback());
}

#[tokio::test]
async fn test_generate_without_context_policy_skips_fallback() {
    let generator = Arc::new(ScriptedGenerator::with_response(
        "Can't check the shelves right now, but we usually stock the basics!",
    ));
    let pipeline = build_pipeline(
        Arc::new(FailingIndex),
        generator.clone(),
        PipelinePolicy {
            generate_without_context: true,
        },
    );

    let question = Question::new("What do you stock?", CustomerType::FirstTime).unwrap();
    let answer = pipeline.answer(&question).await.unwrap();

    assert!(!answer.is_fallback());
    assert_eq!(generator.call_count(), 1);
    // The prompt carries no context section when retrieval failed.
    assert!(!generator.prompts()[0].contains("What you know about the shop right now"));
}

#[tokio::test]
async fn test_long_generated_answer_is_clamped() {
    let embedder = HashEmbedder::new(64);
    let index = seeded_index(&embedder).await;
    let generator = Arc::new(ScriptedGenerator::with_response("a".repeat(5000)));

    let pipeline = build_pipeline(
        Arc::new(index),
        generator,
        PipelinePolicy::default(),
    );

    let question = Question::new("Tell me everything", CustomerType::General).unwrap();
    let answer = pipeline.answer(&question).await.unwrap();

    assert!(answer.text().chars().count() <= 1200);
    assert!(!answer.is_fallback());
}
