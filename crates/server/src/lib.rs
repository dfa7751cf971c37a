//! Shop assistant server
//!
//! HTTP endpoints for the kiosk frontend, the owner's conversation
//! log, and Prometheus metrics.

pub mod conversation_log;
pub mod http;
pub mod metrics;
pub mod state;

pub use conversation_log::ConversationLog;
pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;
