//! Vector index trait

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One raw match from the index, before thresholding and dedup.
///
/// The index may return near-duplicates; the retrieval orchestrator is
/// responsible for deduplication and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    /// Chunk id.
    pub id: String,
    /// Provider-native similarity score (cosine for the shipped adapters).
    pub score: f32,
    /// Chunk text stored alongside the vector.
    pub text: String,
    /// String metadata stored with the chunk.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl IndexHit {
    pub fn new(id: impl Into<String>, score: f32, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Approximate nearest-neighbor search over pre-embedded knowledge chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` nearest chunks for the query vector,
    /// highest score first.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexHit>>;

    /// Index name for logging.
    fn name(&self) -> &str;
}
