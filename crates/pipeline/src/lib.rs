//! Answering pipeline
//!
//! Wires the retrieval orchestrator, prompt composer, and generation
//! provider into one `answer()` call. Every failure past input
//! validation collapses to the fixed fallback answer; the caller only
//! ever sees an `Err` for an invalid question.

pub mod answering;
pub mod retry;

pub use answering::{AnsweringPipeline, Stage};
pub use retry::call_with_retry;
