//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-length numeric vector for similarity search.
///
/// One call per question. Implementations must be safe to share across
/// concurrent requests.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension produced by this provider.
    fn dim(&self) -> usize;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
