//! Centralized constants for the shop assistant
//!
//! Single source of truth for default values used across the
//! workspace. Settings defaults and provider configs reference these
//! instead of repeating literals.

/// Service endpoints (defaults for local development)
pub mod endpoints {
    /// Ollama embedding endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// Qdrant vector store endpoint (REST API port)
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6333";

    /// Anthropic API endpoint
    pub const ANTHROPIC_DEFAULT: &str = "https://api.anthropic.com";
}

/// Retrieval defaults
pub mod retrieval {
    /// Default number of chunks fed to the prompt
    pub const DEFAULT_TOP_K: usize = 4;

    /// Minimum similarity score to include a chunk; anything below this
    /// would degrade groundedness rather than help it
    pub const MIN_SCORE: f32 = 0.35;

    /// Extra candidates fetched beyond top_k, so dedup and
    /// thresholding still leave enough results
    pub const SEARCH_HEADROOM: usize = 2;
}

/// Prompt budget defaults (characters, not model tokens)
pub mod prompt {
    /// Maximum total composed prompt length
    pub const MAX_PROMPT_CHARS: usize = 6000;

    /// Maximum excerpt taken from a single chunk
    pub const MAX_CHUNK_CHARS: usize = 600;

    /// Maximum answer display length
    pub const MAX_ANSWER_CHARS: usize = 1200;
}

/// Timeouts and retry defaults
pub mod timeouts {
    /// Embedding call timeout (ms)
    pub const EMBED_MS: u64 = 2_000;

    /// Vector search timeout (ms)
    pub const SEARCH_MS: u64 = 2_000;

    /// Generation call timeout (ms) - the slowest hop, but still kiosk-friendly
    pub const GENERATE_MS: u64 = 8_000;

    /// Retries per external call after the first attempt
    pub const MAX_RETRIES: u32 = 1;

    /// Initial backoff between retries (ms), doubled each attempt
    pub const INITIAL_BACKOFF_MS: u64 = 200;
}

/// Generation defaults
pub mod generation {
    /// Keep responses concise and practical
    pub const MAX_TOKENS: usize = 300;

    /// Default model for the Anthropic backend
    pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
}
