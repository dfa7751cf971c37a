//! Configuration management for the shop assistant
//!
//! Supports loading configuration from:
//! - YAML files (config/default.yaml, config/{env}.yaml)
//! - Environment variables (SHOP_ASSISTANT__ prefix)
//!
//! The persona catalog lives here too: a static mapping from declared
//! customer relationship to the tone/content template used by the
//! prompt composer. It is built once at process start and shared
//! read-only across concurrent requests.

pub mod constants;
pub mod personas;
pub mod settings;

pub use personas::{PersonaCatalog, PersonaProfile};
pub use settings::{
    load_settings, ConversationLogConfig, EmbeddingConfig, GenerationConfig, IndexConfig,
    ObservabilityConfig, PipelinePolicy, PromptBudget, RetrievalConfig, RetryConfig,
    RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for shop_assistant_core::Error {
    fn from(err: ConfigError) -> Self {
        shop_assistant_core::Error::Config(err.to_string())
    }
}
