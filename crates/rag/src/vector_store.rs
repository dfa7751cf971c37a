//! Vector index adapters
//!
//! `QdrantIndex` is the production adapter. `InMemoryIndex` computes
//! cosine similarity over an in-process corpus and backs both the test
//! suite and Qdrant-less local development.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use qdrant_client::{
    qdrant::{
        value::Kind, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
        UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};

use uuid::Uuid;

use shop_assistant_core::{Error, IndexHit, KnowledgeChunk, Result, VectorIndex};

use crate::RagError;

/// Qdrant index configuration
#[derive(Debug, Clone)]
pub struct QdrantIndexConfig {
    /// Qdrant endpoint
    pub endpoint: String,
    /// Collection name
    pub collection: String,
    /// Vector dimension
    pub vector_dim: usize,
    /// API key (optional)
    pub api_key: Option<String>,
}

impl Default for QdrantIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: shop_assistant_config::constants::endpoints::QDRANT_DEFAULT.to_string(),
            collection: "shop_knowledge".to_string(),
            vector_dim: 768,
            api_key: None,
        }
    }
}

/// Qdrant-backed vector index
pub struct QdrantIndex {
    client: Qdrant,
    config: QdrantIndexConfig,
}

impl QdrantIndex {
    /// Connect to Qdrant. Uses API key authentication when configured.
    pub async fn new(config: QdrantIndexConfig) -> std::result::Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create the collection if it does not exist (cosine distance).
    pub async fn ensure_collection(&self) -> std::result::Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                        VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| RagError::VectorStore(e.to_string()))?;
        }

        Ok(())
    }

    /// Number of points in the collection.
    pub async fn point_count(&self) -> std::result::Result<u64, RagError> {
        let info = self
            .client
            .collection_info(&self.config.collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(info
            .result
            .map(|r| r.points_count.unwrap_or(0))
            .unwrap_or(0))
    }

    /// Upsert pre-embedded chunks.
    pub async fn upsert(&self, chunks: &[KnowledgeChunk]) -> std::result::Result<(), RagError> {
        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("text".to_string(), chunk.text.clone().into());
                payload.insert("chunk_id".to_string(), chunk.id.clone().into());

                if let Some(ref category) = chunk.metadata.category {
                    payload.insert("category".to_string(), category.clone().into());
                }
                if let Some(ref freshness) = chunk.metadata.freshness {
                    payload.insert("freshness".to_string(), freshness.clone().into());
                }

                // Qdrant point ids must be uuid or integer; the stable
                // chunk id travels in the payload.
                PointStruct::new(
                    uuid_for_chunk(&chunk.id),
                    chunk.embedding.clone(),
                    payload,
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points))
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }

    async fn search_raw(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> std::result::Result<Vec<IndexHit>, RagError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.config.collection, vector.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let mut metadata = HashMap::new();
                let mut text = String::new();
                let mut chunk_id = String::new();

                for (k, v) in point.payload {
                    if let Some(Kind::StringValue(s)) = v.kind {
                        match k.as_str() {
                            "text" => text = s,
                            "chunk_id" => chunk_id = s,
                            _ => {
                                metadata.insert(k, s);
                            },
                        }
                    }
                }

                IndexHit {
                    id: chunk_id,
                    score: point.score,
                    text,
                    metadata,
                }
            })
            .collect();

        Ok(hits)
    }
}

/// Derive a stable point uuid from the chunk id, so re-seeding the
/// same corpus upserts in place.
fn uuid_for_chunk(id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string()
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexHit>> {
        self.search_raw(vector, top_k).await.map_err(Error::from)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

/// In-process cosine-similarity index
pub struct InMemoryIndex {
    chunks: RwLock<Vec<KnowledgeChunk>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    pub fn with_chunks(chunks: Vec<KnowledgeChunk>) -> Self {
        Self {
            chunks: RwLock::new(chunks),
        }
    }

    /// Add pre-embedded chunks.
    pub fn upsert(&self, chunks: Vec<KnowledgeChunk>) {
        let mut store = self.chunks.write();
        for chunk in chunks {
            if let Some(existing) = store.iter_mut().find(|c| c.id == chunk.id) {
                *existing = chunk;
            } else {
                store.push(chunk);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            dot / (na * nb)
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexHit>> {
        let chunks = self.chunks.read();

        let mut hits: Vec<IndexHit> = chunks
            .iter()
            .map(|chunk| {
                let mut hit = IndexHit::new(
                    chunk.id.clone(),
                    Self::cosine(vector, &chunk.embedding),
                    chunk.text.clone(),
                );
                if let Some(ref category) = chunk.metadata.category {
                    hit = hit.with_metadata("category", category.clone());
                }
                hit
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
