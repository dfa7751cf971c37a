//! Core traits and types for the shop assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Capability traits for pluggable providers (embeddings, vector
//!   search, text generation)
//! - Question/Answer domain types
//! - Knowledge chunk types
//! - Error taxonomy

pub mod answer;
pub mod error;
pub mod knowledge;
pub mod question;
pub mod traits;

pub use answer::{Answer, DEFAULT_MAX_ANSWER_CHARS, FALLBACK_ANSWER};
pub use error::{Error, Result};
pub use knowledge::{ChunkMetadata, KnowledgeChunk, ScoredChunk};
pub use question::{CustomerType, Question, MAX_QUESTION_CHARS};

pub use traits::{
    EmbeddingProvider,
    GenerationOptions,
    GenerationProvider,
    IndexHit,
    VectorIndex,
};
