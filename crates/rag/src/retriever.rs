//! Retrieval orchestration
//!
//! Embeds the question, searches the vector index, then applies the
//! score threshold, duplicate removal, and the deterministic ordering
//! the prompt composer relies on.

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shop_assistant_core::{
    ChunkMetadata, EmbeddingProvider, Error, IndexHit, KnowledgeChunk, Result, ScoredChunk,
    VectorIndex, MAX_QUESTION_CHARS,
};

use shop_assistant_config::constants::retrieval::SEARCH_HEADROOM;

/// Coordinates the embedding provider and the vector index
pub struct RetrievalOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    embed_timeout: Option<Duration>,
    search_timeout: Option<Duration>,
}

impl RetrievalOrchestrator {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            embed_timeout: None,
            search_timeout: None,
        }
    }

    /// Bound each provider call separately, so a hung embedding request
    /// cannot eat into the search window.
    pub fn with_call_timeouts(mut self, embed: Duration, search: Duration) -> Self {
        self.embed_timeout = Some(embed);
        self.search_timeout = Some(search);
        self
    }

    /// Retrieve at most `max_results` chunks scoring at least
    /// `min_score`, best first.
    ///
    /// The question is validated before any provider is called, so a
    /// blank or oversized input never costs an embedding request.
    /// Results are ordered by descending score with ties broken by
    /// ascending chunk id, and duplicate ids keep their first
    /// occurrence, so the same index state always yields the same
    /// context list.
    pub async fn retrieve(
        &self,
        question_text: &str,
        max_results: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredChunk>> {
        let trimmed = question_text.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidQuery("question is empty".to_string()));
        }
        if trimmed.chars().count() > MAX_QUESTION_CHARS {
            return Err(Error::InvalidQuery(format!(
                "question exceeds {} characters",
                MAX_QUESTION_CHARS
            )));
        }
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let vector =
            bounded("embedding", self.embed_timeout, self.embedder.embed(trimmed)).await?;

        // Over-fetch so the threshold and dedup passes still leave
        // enough candidates to fill max_results.
        let fetch = max_results.saturating_add(SEARCH_HEADROOM);
        let hits = bounded(
            "vector search",
            self.search_timeout,
            self.index.search(&vector, fetch),
        )
        .await?;

        let results = Self::select(hits, max_results, min_score);
        tracing::debug!(
            candidates = fetch,
            selected = results.len(),
            min_score,
            "retrieval complete"
        );
        Ok(results)
    }

    /// Threshold, dedup, order, truncate. Pure so it can be tested
    /// without providers.
    fn select(hits: Vec<IndexHit>, max_results: usize, min_score: f32) -> Vec<ScoredChunk> {
        let mut seen = std::collections::HashSet::new();
        let mut selected: Vec<ScoredChunk> = Vec::new();

        for hit in hits {
            if hit.score < min_score {
                continue;
            }
            if !seen.insert(hit.id.clone()) {
                continue;
            }
            selected.push(scored_from_hit(hit));
        }

        selected.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        selected.truncate(max_results);
        selected
    }
}

/// Apply an optional per-call timeout, mapping elapsed time to a
/// transient retrieval error.
async fn bounded<T>(
    label: &str,
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Retrieval(format!("{} timed out after {:?}", label, limit)))?,
        None => fut.await,
    }
}

fn scored_from_hit(hit: IndexHit) -> ScoredChunk {
    let metadata = ChunkMetadata {
        category: hit.metadata.get("category").cloned(),
        freshness: hit.metadata.get("freshness").cloned(),
    };
    let chunk = KnowledgeChunk {
        id: hit.id,
        text: hit.text,
        embedding: Vec::new(),
        metadata,
    };
    ScoredChunk::new(chunk, hit.score)
}
