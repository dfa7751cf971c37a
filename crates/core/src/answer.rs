//! Answer type and the fixed fallback contract

use serde::{Deserialize, Serialize};

/// The exact apology returned whenever any stage fails unrecoverably.
///
/// This string is a versioned contract with the UI layer: the chat
/// frontend matches on it to render the "till's playing up" state.
/// Changing it is a breaking interface change.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I'm having a bit of trouble right now. The till's playing up! Try again in a moment.";

/// Default cap on answer display length, in characters.
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 1200;

/// Final text returned to the caller.
///
/// Invariant: never empty, never longer than the configured display
/// cap. Both are enforced by the constructors, so downstream code can
/// hand the text straight to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answer {
    text: String,
}

impl Answer {
    /// Build an answer from generated text, trimming and clamping to
    /// `max_chars`. Empty generated text yields the fallback instead,
    /// so the non-empty invariant always holds.
    pub fn generated(text: impl Into<String>, max_chars: usize) -> Self {
        let text = text.into();
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Self::fallback();
        }

        let clamped: String = trimmed.chars().take(max_chars).collect();
        Self { text: clamped }
    }

    /// The fixed apology answer.
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_ANSWER.to_string(),
        }
    }

    /// Whether this is the fixed fallback answer.
    pub fn is_fallback(&self) -> bool {
        self.text == FALLBACK_ANSWER
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_text_exact() {
        // Byte-exact UI contract.
        assert_eq!(
            Answer::fallback().text(),
            "Sorry, I'm having a bit of trouble right now. The till's playing up! Try again in a moment."
        );
    }

    #[test]
    fn test_generated_trims_and_clamps() {
        let a = Answer::generated("  hello there  ", 5);
        assert_eq!(a.text(), "hello");
    }

    #[test]
    fn test_empty_generated_becomes_fallback() {
        let a = Answer::generated("   ", DEFAULT_MAX_ANSWER_CHARS);
        assert!(a.is_fallback());
    }

    #[test]
    fn test_never_empty() {
        let a = Answer::generated("", DEFAULT_MAX_ANSWER_CHARS);
        assert!(!a.text().is_empty());
    }
}
