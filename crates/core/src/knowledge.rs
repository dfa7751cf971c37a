//! Knowledge corpus types
//!
//! A `KnowledgeChunk` is a discrete, independently retrievable piece of
//! shop knowledge. Chunks are created at ingestion time and are
//! read-only to the answering core; a `ScoredChunk` pairs one with a
//! similarity score for a single query and is discarded after prompt
//! composition.

use serde::{Deserialize, Serialize};

/// Optional descriptive metadata attached to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Topic category (e.g. "produce", "payment").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Freshness note (e.g. "restocked daily").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<String>,
}

/// A unit of shop knowledge with its precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Stable unique id within the corpus.
    pub id: String,
    /// Source text fed to the prompt when retrieved.
    pub text: String,
    /// Precomputed embedding vector.
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl KnowledgeChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: Vec::new(),
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = Some(category.into());
        self
    }
}

/// A knowledge chunk paired with its similarity score for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: KnowledgeChunk, score: f32) -> Self {
        Self { chunk, score }
    }

    pub fn id(&self) -> &str {
        &self.chunk.id
    }

    pub fn text(&self) -> &str {
        &self.chunk.text
    }
}
