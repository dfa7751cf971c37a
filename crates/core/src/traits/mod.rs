//! Capability traits for the three external providers
//!
//! Each provider is a narrow interface with a single production
//! adapter and a trivial in-memory stub for tests:
//!
//! ```text
//! Embeddings:
//!   - EmbeddingProvider: text -> fixed-length vector
//!
//! Vector search:
//!   - VectorIndex: vector -> nearest knowledge chunks
//!
//! Generation:
//!   - GenerationProvider: prompt -> free-text answer
//! ```
//!
//! The answering pipeline only ever talks to these traits, so backends
//! can be swapped without touching the pipeline.

mod embedder;
mod generator;
mod index;

pub use embedder::EmbeddingProvider;
pub use generator::{GenerationOptions, GenerationProvider};
pub use index::{IndexHit, VectorIndex};
