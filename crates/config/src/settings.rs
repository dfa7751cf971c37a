//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, generation, prompt, retrieval, timeouts};
use crate::ConfigError;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Retrieval orchestrator configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Prompt composer budgets
    #[serde(default)]
    pub prompt: PromptBudget,

    /// Embedding provider connection
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index connection
    #[serde(default)]
    pub index: IndexConfig,

    /// Generation provider connection
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Pipeline failure policy
    #[serde(default)]
    pub policy: PipelinePolicy,

    /// Retry/timeout policy for external calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Daily conversation log for owner review
    #[serde(default)]
    pub conversation_log: ConversationLogConfig,

    /// Path to the curated knowledge corpus (YAML)
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: String,

    /// Optional persona overlay file (YAML keyed by customer tag).
    /// Unset means the built-in shopkeeper voices.
    #[serde(default)]
    pub personas_path: Option<String>,
}

fn default_knowledge_path() -> String {
    "config/knowledge.yaml".to_string()
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings. In production invalid values are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_retrieval()?;
        self.validate_prompt()?;
        self.validate_server()?;
        self.validate_retry()?;
        Ok(())
    }

    fn validate_retrieval(&self) -> Result<(), ConfigError> {
        let r = &self.retrieval;

        if r.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if r.top_k > 20 {
            tracing::warn!(
                top_k = r.top_k,
                "retrieval.top_k is unusually large; the prompt budget will drop most chunks"
            );
        }

        if !(0.0..=1.0).contains(&r.min_score) {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.min_score".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", r.min_score),
            });
        }

        Ok(())
    }

    fn validate_prompt(&self) -> Result<(), ConfigError> {
        let p = &self.prompt;

        if p.max_prompt_chars < 500 {
            return Err(ConfigError::InvalidValue {
                field: "prompt.max_prompt_chars".to_string(),
                message: "Budget too small to hold persona and question (minimum 500)".to_string(),
            });
        }

        if p.max_chunk_chars == 0 || p.max_chunk_chars > p.max_prompt_chars {
            return Err(ConfigError::InvalidValue {
                field: "prompt.max_chunk_chars".to_string(),
                message: format!(
                    "Must be between 1 and max_prompt_chars ({})",
                    p.max_prompt_chars
                ),
            });
        }

        if p.max_answer_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "prompt.max_answer_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block the kiosk frontend."
            );
        }

        Ok(())
    }

    fn validate_retry(&self) -> Result<(), ConfigError> {
        if self.retry.max_retries > 5 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_retries".to_string(),
                message: "More than 5 retries would blow the kiosk latency budget".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from files and environment.
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("SHOP_ASSISTANT").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_request_timeout() -> u64 {
    15
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Retrieval orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks returned to the composer
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity score to include a chunk
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    retrieval::DEFAULT_TOP_K
}
fn default_min_score() -> f32 {
    retrieval::MIN_SCORE
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

/// Prompt composer budgets (characters)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBudget {
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    #[serde(default = "default_max_answer_chars")]
    pub max_answer_chars: usize,
}

fn default_max_prompt_chars() -> usize {
    prompt::MAX_PROMPT_CHARS
}
fn default_max_chunk_chars() -> usize {
    prompt::MAX_CHUNK_CHARS
}
fn default_max_answer_chars() -> usize {
    prompt::MAX_ANSWER_CHARS
}

impl Default for PromptBudget {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            max_chunk_chars: default_max_chunk_chars(),
            max_answer_chars: default_max_answer_chars(),
        }
    }
}

/// Embedding provider connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Ollama endpoint
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
}

fn default_embedding_endpoint() -> String {
    endpoints::OLLAMA_DEFAULT.to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_embedding_dim() -> usize {
    768
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
        }
    }
}

/// Vector index connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Qdrant endpoint
    #[serde(default = "default_index_endpoint")]
    pub endpoint: String,

    /// Collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// API key (optional, for cloud deployments)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Seed the collection from the knowledge file when it is empty
    #[serde(default = "default_true")]
    pub seed_on_start: bool,
}

fn default_index_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}
fn default_collection() -> String {
    "shop_knowledge".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            endpoint: default_index_endpoint(),
            collection: default_collection(),
            api_key: None,
            seed_on_start: true,
        }
    }
}

/// Generation provider connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Anthropic API endpoint
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    /// Model id
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API key. Falls back to ANTHROPIC_API_KEY when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum tokens per answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_generation_endpoint() -> String {
    endpoints::ANTHROPIC_DEFAULT.to_string()
}
fn default_generation_model() -> String {
    generation::DEFAULT_MODEL.to_string()
}
fn default_max_tokens() -> usize {
    generation::MAX_TOKENS
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            model: default_generation_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl GenerationConfig {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

/// Pipeline failure policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePolicy {
    /// When retrieval fails, continue and generate with persona +
    /// question only instead of short-circuiting to the fallback.
    /// Off by default: an ungrounded answer about stock or prices is
    /// worse than the apology.
    #[serde(default)]
    pub generate_without_context: bool,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            generate_without_context: false,
        }
    }
}

/// Retry/timeout policy for external calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries per external call after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between retries (ms), doubled each attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Embedding call timeout (ms)
    #[serde(default = "default_embed_timeout_ms")]
    pub embed_timeout_ms: u64,

    /// Vector search timeout (ms)
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Generation call timeout (ms)
    #[serde(default = "default_generate_timeout_ms")]
    pub generate_timeout_ms: u64,
}

fn default_max_retries() -> u32 {
    timeouts::MAX_RETRIES
}
fn default_initial_backoff_ms() -> u64 {
    timeouts::INITIAL_BACKOFF_MS
}
fn default_embed_timeout_ms() -> u64 {
    timeouts::EMBED_MS
}
fn default_search_timeout_ms() -> u64 {
    timeouts::SEARCH_MS
}
fn default_generate_timeout_ms() -> u64 {
    timeouts::GENERATE_MS
}

impl RetryConfig {
    pub fn embed_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn search_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.search_timeout_ms)
    }

    pub fn generate_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.generate_timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            embed_timeout_ms: default_embed_timeout_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            generate_timeout_ms: default_generate_timeout_ms(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level for the env filter default
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON logs instead of human-readable
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Daily conversation log for owner review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLogConfig {
    /// Enable the daily log file
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log file path
    #[serde(default = "default_conversation_log_path")]
    pub path: String,
}

fn default_conversation_log_path() -> String {
    "daily_conversations.txt".to_string()
}

impl Default for ConversationLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_conversation_log_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_min_score_range_enforced() {
        let mut settings = Settings::default();
        settings.retrieval.min_score = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_tiny_prompt_budget_rejected() {
        let mut settings = Settings::default();
        settings.prompt.max_prompt_chars = 100;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_policy_defaults_to_short_circuit() {
        assert!(!PipelinePolicy::default().generate_without_context);
    }
}
