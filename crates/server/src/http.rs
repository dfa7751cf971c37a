//! HTTP endpoints
//!
//! REST API for the shop kiosk frontend plus the owner's conversation
//! log endpoints.

use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use shop_assistant_core::{CustomerType, Error, Question};

use crate::metrics::metrics_handler;
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.settings.server.cors_origins,
        state.settings.server.cors_enabled,
    );
    let timeout = Duration::from_secs(state.settings.server.request_timeout_seconds);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health_check))
        .route("/api/shop-info", get(shop_info))
        .route("/api/conversations", get(get_conversations))
        .route("/api/conversations/clear", post(clear_conversations))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// Disabled CORS means permissive (development only). With CORS on but
/// no origins configured, only localhost:3000 is allowed so a missing
/// config entry fails closed.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Chat request from the kiosk
#[derive(Debug, Deserialize)]
struct ChatRequest {
    question: String,
    #[serde(default = "default_customer_type")]
    customer_type: String,
}

fn default_customer_type() -> String {
    "general".to_string()
}

/// Chat response
#[derive(Debug, Serialize)]
struct ChatResponse {
    answer: String,
}

/// Chat endpoint
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    let request_id = Uuid::new_v4();
    let customer_type = CustomerType::from_tag(&request.customer_type);
    let client_ip = client_ip(&headers);

    let question = Question::new(&request.question, customer_type).map_err(|e| {
        tracing::info!(%request_id, error = %e, "rejected question");
        metrics::counter!("shop_invalid_queries_total").increment(1);
        invalid_query_response(&e)
    })?;

    let answer = match state.pipeline.answer(&question).await {
        Ok(answer) => answer,
        Err(e @ Error::InvalidQuery(_)) => {
            metrics::counter!("shop_invalid_queries_total").increment(1);
            return Err(invalid_query_response(&e));
        },
        Err(e) => {
            // The pipeline folds everything else into the fallback, so
            // this arm is unreachable in practice. Fail loud if not.
            tracing::error!(%request_id, error = %e, "unexpected pipeline error");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal error" })),
            ));
        },
    };

    tracing::info!(
        %request_id,
        customer_type = customer_type.as_tag(),
        fallback = answer.is_fallback(),
        "question answered"
    );

    state.conversations.append(
        customer_type.as_tag(),
        question.text(),
        answer.text(),
        &client_ip,
    );

    Ok(Json(ChatResponse {
        answer: answer.into_text(),
    }))
}

fn invalid_query_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
}

/// First hop of X-Forwarded-For, or "unknown". The kiosk sits behind a
/// reverse proxy, so the socket address is never the customer.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "message": "Dave's shop is open!",
    }))
}

/// Basic shop information for the kiosk's about screen
async fn shop_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Dave's Village Shop",
        "type": "Honesty Box",
        "location": "Village High Street",
        "owner": "Dave",
        "payment_methods": ["Cash (honesty box)", "Exact change preferred"],
        "specialty": "Fresh local produce, eggs, milk, and essentials",
    }))
}

/// Download the day's conversations for owner review
async fn get_conversations(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "conversations": state.conversations.read_all(),
        "filename": state.conversations.file_name(),
    }))
}

/// Archive today's conversations and start fresh
async fn clear_conversations(State(state): State<AppState>) -> impl IntoResponse {
    match state.conversations.clear() {
        Ok(Some(archive)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("Conversations archived as {}", archive),
            })),
        ),
        Ok(None) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "No conversations to clear" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to clear conversations");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": format!("Failed to clear conversations: {}", e),
                })),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use shop_assistant_config::{PersonaCatalog, Settings};
    use shop_assistant_llm::{PromptComposer, ScriptedGenerator};
    use shop_assistant_pipeline::AnsweringPipeline;
    use shop_assistant_rag::{HashEmbedder, InMemoryIndex, RetrievalOrchestrator};

    use crate::conversation_log::ConversationLog;

    fn test_state(dir: &tempfile::TempDir, generator: Arc<ScriptedGenerator>) -> AppState {
        let settings = Settings::default();
        let retriever = RetrievalOrchestrator::new(
            Arc::new(HashEmbedder::new(64)),
            Arc::new(InMemoryIndex::new()),
        );
        let pipeline = AnsweringPipeline::new(
            retriever,
            PromptComposer::new(settings.prompt.clone(), settings.generation.max_tokens),
            generator,
            PersonaCatalog::default_catalog(),
            settings.retrieval.clone(),
            settings.policy.clone(),
            settings.retry.clone(),
            settings.prompt.max_answer_chars,
        );
        let log = ConversationLog::new(dir.path().join("daily_conversations.txt"), true);

        AppState::new(Arc::new(settings), Arc::new(pipeline), Arc::new(log))
    }

    #[test]
    fn test_router_creation() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedGenerator::with_response("hi")));
        let _ = create_router(state);
    }

    #[tokio::test]
    async fn test_chat_logs_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(
            &dir,
            Arc::new(ScriptedGenerator::with_response("Fresh as can be!")),
        );

        let response = chat(
            State(state.clone()),
            HeaderMap::new(),
            Json(ChatRequest {
                question: "Are the eggs fresh?".to_string(),
                customer_type: "returning".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.answer, "Fresh as can be!");

        let logged = state.conversations.read_all();
        assert!(logged.contains("Customer Type: returning"));
        assert!(logged.contains("Question: Are the eggs fresh?"));
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_question() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedGenerator::with_response("unused")));

        let result = chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                question: "   ".to_string(),
                customer_type: default_customer_type(),
            }),
        )
        .await;

        let (status, _body) = result.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_rejected_question_increments_invalid_query_counter() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedGenerator::with_response("unused")));

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        // Runs on this thread so the local recorder sees the counter.
        let result = metrics::with_local_recorder(&recorder, || {
            rt.block_on(chat(
                State(state),
                HeaderMap::new(),
                Json(ChatRequest {
                    question: "   ".to_string(),
                    customer_type: default_customer_type(),
                }),
            ))
        });
        assert!(result.is_err());

        let counted = snapshotter.snapshot().into_vec().into_iter().any(
            |(key, _unit, _desc, value)| {
                key.key().name() == "shop_invalid_queries_total"
                    && matches!(value, DebugValue::Counter(1))
            },
        );
        assert!(counted, "rejection did not increment shop_invalid_queries_total");
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
