//! Knowledge corpus loading
//!
//! The shop corpus lives in a YAML file of small, self-contained
//! chunks. Chunks are embedded once at startup and upserted into the
//! configured index.

use std::path::Path;

use serde::Deserialize;

use shop_assistant_core::{ChunkMetadata, EmbeddingProvider, KnowledgeChunk};

use crate::RagError;

/// On-disk corpus format
#[derive(Debug, Deserialize)]
pub struct KnowledgeFile {
    pub chunks: Vec<KnowledgeEntry>,
}

/// Single corpus entry
#[derive(Debug, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub freshness: Option<String>,
}

/// Loads and embeds the knowledge corpus
pub struct KnowledgeLoader;

impl KnowledgeLoader {
    /// Parse the corpus file. Duplicate ids are rejected so a corpus
    /// edit cannot silently shadow an existing chunk.
    pub fn load(path: impl AsRef<Path>) -> Result<KnowledgeFile, RagError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RagError::Knowledge(format!("failed to read {}: {}", path.display(), e))
        })?;

        let file: KnowledgeFile = serde_yaml::from_str(&raw)
            .map_err(|e| RagError::Knowledge(format!("failed to parse {}: {}", path.display(), e)))?;

        if file.chunks.is_empty() {
            return Err(RagError::Knowledge(format!(
                "{} contains no chunks",
                path.display()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &file.chunks {
            if !seen.insert(entry.id.as_str()) {
                return Err(RagError::Knowledge(format!(
                    "duplicate chunk id: {}",
                    entry.id
                )));
            }
        }

        Ok(file)
    }

    /// Embed every entry with the given provider.
    pub async fn embed_all(
        file: &KnowledgeFile,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<KnowledgeChunk>, RagError> {
        let mut chunks = Vec::with_capacity(file.chunks.len());

        for entry in &file.chunks {
            let embedding = embedder
                .embed(&entry.text)
                .await
                .map_err(|e| RagError::Embedding(e.to_string()))?;

            let chunk = KnowledgeChunk {
                id: entry.id.clone(),
                text: entry.text.clone(),
                embedding,
                metadata: ChunkMetadata {
                    category: entry.category.clone(),
                    freshness: entry.freshness.clone(),
                },
            };
            chunks.push(chunk);
        }

        tracing::info!(chunks = chunks.len(), "knowledge corpus embedded");
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use std::io::Write;

    const SAMPLE: &str = r#"
chunks:
  - id: eggs
    text: "Fresh eggs come from the Hendersons' farm up the lane."
    category: produce
    freshness: daily
  - id: payment
    text: "Payment goes in the honesty box by the door."
"#;

    fn write_corpus(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_parses_chunks() {
        let f = write_corpus(SAMPLE);
        let file = KnowledgeLoader::load(f.path()).unwrap();
        assert_eq!(file.chunks.len(), 2);
        assert_eq!(file.chunks[0].id, "eggs");
        assert_eq!(file.chunks[0].category.as_deref(), Some("produce"));
        assert!(file.chunks[1].freshness.is_none());
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let f = write_corpus(
            "chunks:\n  - id: a\n    text: one\n  - id: a\n    text: two\n",
        );
        let err = KnowledgeLoader::load(f.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_rejects_empty_corpus() {
        let f = write_corpus("chunks: []\n");
        assert!(KnowledgeLoader::load(f.path()).is_err());
    }

    #[tokio::test]
    async fn test_embed_all_produces_vectors() {
        let f = write_corpus(SAMPLE);
        let file = KnowledgeLoader::load(f.path()).unwrap();
        let embedder = HashEmbedder::new(64);

        let chunks = KnowledgeLoader::embed_all(&file, &embedder).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].embedding.len(), 64);
    }
}
