//! Retrieval for the shop assistant
//!
//! Features:
//! - Dense vector search via Qdrant, with an in-memory index for tests
//!   and Qdrant-less development
//! - Ollama embeddings over HTTP, with a deterministic hash embedder
//!   as the stub
//! - Knowledge corpus loading and startup seeding
//! - The retrieval orchestrator: embed -> search -> threshold ->
//!   dedup -> deterministic ordering

pub mod embeddings;
pub mod knowledge_loader;
pub mod retriever;
pub mod vector_store;

pub use embeddings::{HashEmbedder, OllamaEmbedder, OllamaEmbedderConfig};
pub use knowledge_loader::{KnowledgeFile, KnowledgeLoader};
pub use retriever::RetrievalOrchestrator;
pub use vector_store::{InMemoryIndex, QdrantIndex, QdrantIndexConfig};

use thiserror::Error;

/// Retrieval errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Knowledge file error: {0}")]
    Knowledge(String),
}

impl From<RagError> for shop_assistant_core::Error {
    fn from(err: RagError) -> Self {
        shop_assistant_core::Error::Retrieval(err.to_string())
    }
}
