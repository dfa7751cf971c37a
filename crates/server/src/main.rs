//! Shop assistant server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use shop_assistant_config::{load_settings, PersonaCatalog, Settings};
use shop_assistant_core::{EmbeddingProvider, GenerationProvider, KnowledgeChunk, VectorIndex};
use shop_assistant_llm::{ClaudeBackend, ClaudeConfig, PromptComposer, ScriptedGenerator};
use shop_assistant_pipeline::AnsweringPipeline;
use shop_assistant_rag::{
    InMemoryIndex, KnowledgeLoader, OllamaEmbedder, OllamaEmbedderConfig, QdrantIndex,
    QdrantIndexConfig, RetrievalOrchestrator,
};
use shop_assistant_server::{create_router, init_metrics, AppState, ConversationLog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("SHOP_ASSISTANT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&settings);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        config = env.as_deref().unwrap_or("default"),
        "Starting shop assistant server"
    );

    init_metrics();
    tracing::info!("Prometheus metrics available at /metrics");

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(
        OllamaEmbedderConfig::from(&settings.embedding),
    ));

    let chunks = if settings.index.seed_on_start {
        load_corpus(&settings, embedder.as_ref()).await?
    } else {
        Vec::new()
    };

    let index = build_index(&settings, &chunks).await?;

    let generator = build_generator(&settings)?;
    let personas = load_personas(&settings)?;

    let pipeline = AnsweringPipeline::new(
        RetrievalOrchestrator::new(embedder, index)
            .with_call_timeouts(settings.retry.embed_timeout(), settings.retry.search_timeout()),
        PromptComposer::new(settings.prompt.clone(), settings.generation.max_tokens),
        generator,
        personas,
        settings.retrieval.clone(),
        settings.policy.clone(),
        settings.retry.clone(),
        settings.prompt.max_answer_chars,
    );

    let conversations = ConversationLog::new(
        settings.conversation_log.path.clone(),
        settings.conversation_log.enabled,
    );

    let port = settings.server.port;
    let state = AppState::new(
        Arc::new(settings),
        Arc::new(pipeline),
        Arc::new(conversations),
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Load and embed the knowledge corpus for index seeding.
///
/// In development a failed corpus load degrades to an empty index so
/// the server still comes up; in production it is fatal.
async fn load_corpus(
    settings: &Settings,
    embedder: &dyn EmbeddingProvider,
) -> anyhow::Result<Vec<KnowledgeChunk>> {
    let result = match KnowledgeLoader::load(&settings.knowledge_path) {
        Ok(file) => KnowledgeLoader::embed_all(&file, embedder).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(chunks) => {
            tracing::info!(
                path = %settings.knowledge_path,
                chunks = chunks.len(),
                "knowledge corpus loaded"
            );
            Ok(chunks)
        },
        Err(e) if settings.environment.is_production() => {
            Err(anyhow::anyhow!("failed to seed knowledge corpus: {}", e))
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                "failed to seed knowledge corpus, answers will have no shop context"
            );
            Ok(Vec::new())
        },
    }
}

/// Connect to Qdrant, falling back to the in-process index when it is
/// unreachable.
async fn build_index(
    settings: &Settings,
    chunks: &[KnowledgeChunk],
) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let config = QdrantIndexConfig {
        endpoint: settings.index.endpoint.clone(),
        collection: settings.index.collection.clone(),
        vector_dim: settings.embedding.dim,
        api_key: settings.index.api_key.clone(),
    };

    let qdrant_ready = match QdrantIndex::new(config).await {
        Ok(qdrant) => match qdrant.ensure_collection().await {
            Ok(()) => Some(qdrant),
            Err(e) => {
                tracing::warn!(error = %e, "qdrant collection setup failed");
                None
            },
        },
        Err(e) => {
            tracing::warn!(error = %e, "qdrant connection failed");
            None
        },
    };

    match qdrant_ready {
        Some(qdrant) => {
            if !chunks.is_empty() {
                qdrant
                    .upsert(chunks)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to seed qdrant: {}", e))?;
            }
            tracing::info!(
                endpoint = %settings.index.endpoint,
                collection = %settings.index.collection,
                "using qdrant vector index"
            );
            Ok(Arc::new(qdrant))
        },
        None if settings.environment.is_production() => {
            Err(anyhow::anyhow!("qdrant unavailable in production"))
        },
        None => {
            tracing::warn!("falling back to in-memory vector index");
            let memory = InMemoryIndex::new();
            memory.upsert(chunks.to_vec());
            Ok(Arc::new(memory))
        },
    }
}

/// Load the persona overlay when one is configured. A missing or
/// malformed overlay file is fatal; silently reverting to the built-in
/// voices would hide a deployment mistake.
fn load_personas(settings: &Settings) -> anyhow::Result<PersonaCatalog> {
    match &settings.personas_path {
        Some(path) => {
            let catalog = PersonaCatalog::from_yaml_file(path)
                .map_err(|e| anyhow::anyhow!("failed to load persona overlay: {}", e))?;
            tracing::info!(path = %path, "persona overlay loaded");
            Ok(catalog)
        },
        None => Ok(PersonaCatalog::default_catalog()),
    }
}

/// Build the generation provider. Without an API key the development
/// server uses a canned response so the kiosk flow stays testable.
fn build_generator(settings: &Settings) -> anyhow::Result<Arc<dyn GenerationProvider>> {
    match settings.generation.resolve_api_key() {
        Some(api_key) => {
            let config = ClaudeConfig::new(api_key)
                .with_model(settings.generation.model.clone())
                .with_endpoint(settings.generation.endpoint.clone());
            let backend = ClaudeBackend::new(config)
                .map_err(|e| anyhow::anyhow!("claude backend init failed: {}", e))?;
            tracing::info!(model = %settings.generation.model, "using claude generation backend");
            Ok(Arc::new(backend))
        },
        None if settings.environment.is_production() => Err(anyhow::anyhow!(
            "ANTHROPIC_API_KEY is required in production"
        )),
        None => {
            tracing::warn!("no API key configured, using scripted generator");
            Ok(Arc::new(ScriptedGenerator::with_response(
                "Hello! The shop's all stocked up, have a look around and pop \
                 your money in the honesty box.",
            )))
        },
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("shop_assistant={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
