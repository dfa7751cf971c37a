//! Question and customer type domain values
//!
//! A `Question` is an immutable value that exists for a single request.
//! There is no session or conversation state anywhere in the core; the
//! caller may send any customer type on any turn and each request is
//! answered independently.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum accepted question length, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

/// Declared customer relationship with the shop.
///
/// The tag arrives from the UI as free text; [`CustomerType::from_tag`]
/// is total and maps anything unrecognized to `General` so a malformed
/// tag never takes the pipeline down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    FirstTime,
    #[default]
    General,
    Returning,
}

impl CustomerType {
    /// Parse a tag leniently. Unknown tags fall back to `General`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "first_time" | "first-time" | "firsttime" => CustomerType::FirstTime,
            "returning" | "regular" => CustomerType::Returning,
            _ => CustomerType::General,
        }
    }

    /// Canonical wire tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            CustomerType::FirstTime => "first_time",
            CustomerType::General => "general",
            CustomerType::Returning => "returning",
        }
    }
}

/// A single customer question, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    customer_type: CustomerType,
}

impl Question {
    /// Validate and construct a question.
    ///
    /// Rejects empty (after trimming) and over-long text with
    /// [`Error::InvalidQuery`]; no provider call should ever be made
    /// for a question that fails here.
    pub fn new(text: impl Into<String>, customer_type: CustomerType) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Err(Error::InvalidQuery("question must not be empty".to_string()));
        }

        let len = trimmed.chars().count();
        if len > MAX_QUESTION_CHARS {
            return Err(Error::InvalidQuery(format!(
                "question too long: {} characters (maximum {})",
                len, MAX_QUESTION_CHARS
            )));
        }

        Ok(Self {
            text: trimmed.to_string(),
            customer_type,
        })
    }

    /// The question text, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn customer_type(&self) -> CustomerType {
        self.customer_type
    }
}
