//! Shared application state

use std::sync::Arc;

use shop_assistant_config::Settings;
use shop_assistant_pipeline::AnsweringPipeline;

use crate::conversation_log::ConversationLog;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<AnsweringPipeline>,
    pub conversations: Arc<ConversationLog>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        pipeline: Arc<AnsweringPipeline>,
        conversations: Arc<ConversationLog>,
    ) -> Self {
        Self {
            settings,
            pipeline,
            conversations,
        }
    }
}
