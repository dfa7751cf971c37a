//! Prompt composition
//!
//! Builds the single prompt sent to the generation provider out of
//! four parts, always in the same order: the shopkeeper persona with
//! the customer-type directives, a fixed set of worked example
//! answers, the retrieved context excerpts, and the customer's
//! question verbatim.

use shop_assistant_config::{PersonaProfile, PromptBudget};
use shop_assistant_core::{GenerationOptions, Question, ScoredChunk};

/// Worked examples of the shopkeeper's register. Kept in the prompt
/// verbatim so answer tone survives model upgrades.
const DAVE_EXAMPLES: &str = "\
Q: How do I pay for items?
A: Right, just pop your money in the honesty box there! We take cash - coins or notes, whatever you've got. Just match what the price says on the label. Been running this way for years and folks are brilliant about it. Trust works both ways in our village!

Q: What if I don't have exact change?
A: No worries at all! Take what change you need from the box - there's usually some coins in there. Or if you're a regular, just catch me up next time you're passing. Village life, isn't it? We look after each other.

Q: Are the eggs fresh?
A: Oh yes, lovely fresh eggs from our hens! Collected this morning as always. You can see the date on the box - never more than a day or two old. The girls are free-range and happy, so you get proper golden yolks. Can't beat a fresh village egg!

Q: Do you have milk?
A: Should do! Check the little fridge unit - we get deliveries Tuesday and Friday from the local dairy. All fresh, usually gone by Saturday though - very popular! If we're out, there might be some long-life cartons on the shelf as backup.";

/// A prompt ready to send, paired with the generation options the
/// persona asks for.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub text: String,
    pub options: GenerationOptions,
    /// How many context chunks survived the character budget.
    pub chunks_used: usize,
}

/// Composes prompts under a character budget
#[derive(Debug, Clone)]
pub struct PromptComposer {
    budget: PromptBudget,
    max_tokens: usize,
}

impl PromptComposer {
    pub fn new(budget: PromptBudget, max_tokens: usize) -> Self {
        Self { budget, max_tokens }
    }

    /// Compose the prompt for a question and its retrieved context.
    ///
    /// Context chunks arrive best-first. If the assembled prompt
    /// exceeds the budget, whole chunks are dropped from the lowest
    /// rank upward until it fits; a chunk is never truncated mid-text
    /// beyond the per-chunk excerpt limit. When even a chunk-free
    /// prompt is over budget, the worked examples are dropped and the
    /// chunk fitting restarts without them. The persona and the
    /// question are never dropped. The same inputs always produce the
    /// same prompt.
    pub fn compose(
        &self,
        question: &Question,
        persona: &PersonaProfile,
        context: &[ScoredChunk],
    ) -> ComposedPrompt {
        let excerpts: Vec<String> = context
            .iter()
            .map(|scored| clamp_chars(scored.text(), self.budget.max_chunk_chars))
            .collect();

        let (text, keep) = self.fit(question, persona, &excerpts, true);
        let (text, keep) = if text.chars().count() > self.budget.max_prompt_chars {
            tracing::warn!(
                budget = self.budget.max_prompt_chars,
                "worked examples dropped to fit prompt budget"
            );
            self.fit(question, persona, &excerpts, false)
        } else {
            (text, keep)
        };

        if keep < excerpts.len() {
            tracing::debug!(
                dropped = excerpts.len() - keep,
                "context chunks dropped to fit prompt budget"
            );
        }

        let options = GenerationOptions::default()
            .with_max_tokens(self.max_tokens)
            .with_temperature(persona.temperature);

        ComposedPrompt {
            text,
            options,
            chunks_used: keep,
        }
    }

    /// Drop chunks lowest-rank-first until the prompt fits, returning
    /// the assembled text and how many chunks survived.
    fn fit(
        &self,
        question: &Question,
        persona: &PersonaProfile,
        excerpts: &[String],
        with_examples: bool,
    ) -> (String, usize) {
        let mut keep = excerpts.len();
        let mut text = self.assemble(question, persona, &excerpts[..keep], with_examples);
        while keep > 0 && text.chars().count() > self.budget.max_prompt_chars {
            keep -= 1;
            text = self.assemble(question, persona, &excerpts[..keep], with_examples);
        }
        (text, keep)
    }

    fn assemble(
        &self,
        question: &Question,
        persona: &PersonaProfile,
        excerpts: &[String],
        with_examples: bool,
    ) -> String {
        let mut prompt = String::with_capacity(self.budget.max_prompt_chars.min(8192));

        prompt.push_str(
            "You are Dave, the friendly owner of a village honesty box shop. You're warm, \
             helpful, and have that genuine village shopkeeper personality. You trust your \
             customers and believe in community spirit.\n\n",
        );
        prompt.push_str(
            "You collect customer feedback and pass it to the shop owner who makes decisions \
             about products and prices. If customers have suggestions, complaints, or requests, \
             let them know you'll pass it along.\n\n",
        );

        prompt.push_str(&persona.greeting_style);
        prompt.push('\n');
        for directive in &persona.tone_directives {
            prompt.push_str("- ");
            prompt.push_str(directive);
            prompt.push('\n');
        }
        if !persona.topic_emphasis.is_empty() {
            prompt.push_str("Pay particular attention to: ");
            prompt.push_str(&persona.topic_emphasis.join(", "));
            prompt.push_str(".\n");
        }
        prompt.push('\n');

        if with_examples {
            prompt.push_str("Examples of how you respond:\n");
            prompt.push_str(DAVE_EXAMPLES);
            prompt.push_str("\n\n");
        }

        if !excerpts.is_empty() {
            prompt.push_str("What you know about the shop right now:\n");
            for (i, excerpt) in excerpts.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, excerpt));
            }
            prompt.push('\n');
        }

        prompt.push_str("Customer asks: ");
        prompt.push_str(question.text());
        prompt.push_str("\n\n");
        prompt.push_str(
            "Respond as Dave in a helpful, friendly way. Keep it conversational and practical. \
             If it's about products, stick to what you know from above. If it's about payment, \
             explain the honesty system warmly. If they have feedback, acknowledge it and \
             mention you'll pass it to the owner. Stay in character as a genuine village shop \
             assistant.\n\nDave:",
        );

        prompt
    }
}

/// Clamp to a character count, appending an ellipsis when cut.
fn clamp_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_assistant_config::PersonaCatalog;
    use shop_assistant_core::{CustomerType, KnowledgeChunk};

    fn question(text: &str) -> Question {
        Question::new(text, CustomerType::General).unwrap()
    }

    fn scored(id: &str, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk::new(KnowledgeChunk::new(id, text), score)
    }

    fn composer(max_prompt_chars: usize) -> PromptComposer {
        let budget = PromptBudget {
            max_prompt_chars,
            max_chunk_chars: 600,
            max_answer_chars: 1200,
        };
        PromptComposer::new(budget, 300)
    }

    fn general_persona() -> PersonaProfile {
        PersonaCatalog::default_catalog()
            .profile_for(CustomerType::General)
            .clone()
    }

    #[test]
    fn test_prompt_contains_question_verbatim() {
        let prompt = composer(6000).compose(
            &question("Where do the eggs come from?"),
            &general_persona(),
            &[],
        );
        assert!(prompt.text.contains("Customer asks: Where do the eggs come from?"));
    }

    #[test]
    fn test_prompt_numbers_context_chunks_in_rank_order() {
        let context = vec![
            scored("a", "Eggs come from the Hendersons' farm.", 0.9),
            scored("b", "Milk arrives Tuesday and Friday.", 0.7),
        ];
        let prompt = composer(6000).compose(&question("eggs?"), &general_persona(), &context);
        assert!(prompt.text.contains("1. Eggs come from the Hendersons' farm."));
        assert!(prompt.text.contains("2. Milk arrives Tuesday and Friday."));
        assert_eq!(prompt.chunks_used, 2);
    }

    #[test]
    fn test_budget_drops_lowest_ranked_chunks_first() {
        let context = vec![
            scored("best", "short best chunk", 0.9),
            scored("worst", &"x".repeat(500), 0.5),
        ];
        // Tight budget: only the best chunk fits.
        let base = composer(6000)
            .compose(&question("eggs?"), &general_persona(), &[context[0].clone()])
            .text
            .chars()
            .count();

        let prompt = composer(base + 10).compose(&question("eggs?"), &general_persona(), &context);
        assert_eq!(prompt.chunks_used, 1);
        assert!(prompt.text.contains("short best chunk"));
        assert!(!prompt.text.contains("xxxxx"));
    }

    #[test]
    fn test_over_budget_with_no_chunks_still_composes() {
        let prompt = composer(10).compose(&question("hello?"), &general_persona(), &[]);
        assert_eq!(prompt.chunks_used, 0);
        assert!(prompt.text.contains("Customer asks: hello?"));
    }

    #[test]
    fn test_tight_budget_drops_worked_examples() {
        // 2000 chars is below the fixed sections with examples but
        // comfortably above them without.
        let prompt = composer(2000).compose(&question("eggs?"), &general_persona(), &[]);
        assert!(prompt.text.chars().count() <= 2000);
        assert!(!prompt.text.contains("Examples of how you respond:"));
        assert!(prompt.text.contains("Customer asks: eggs?"));

        let roomy = composer(6000).compose(&question("eggs?"), &general_persona(), &[]);
        assert!(roomy.text.contains("Examples of how you respond:"));
    }

    #[test]
    fn test_dropping_examples_lets_chunks_back_in() {
        let context = vec![scored("a", "Eggs come from the Hendersons' farm.", 0.9)];
        let prompt = composer(2000).compose(&question("eggs?"), &general_persona(), &context);
        assert!(prompt.text.chars().count() <= 2000);
        assert_eq!(prompt.chunks_used, 1);
        assert!(!prompt.text.contains("Examples of how you respond:"));
        assert!(prompt.text.contains("Eggs come from the Hendersons' farm."));
    }

    #[test]
    fn test_same_inputs_same_prompt() {
        let context = vec![scored("a", "Eggs from the farm.", 0.9)];
        let q = question("eggs?");
        let p = general_persona();
        let one = composer(6000).compose(&q, &p, &context);
        let two = composer(6000).compose(&q, &p, &context);
        assert_eq!(one.text, two.text);
    }

    #[test]
    fn test_persona_temperature_flows_into_options() {
        let persona = PersonaCatalog::default_catalog()
            .profile_for(CustomerType::FirstTime)
            .clone();
        let prompt = composer(6000).compose(&question("how does this work?"), &persona, &[]);
        assert!((prompt.options.temperature - persona.temperature).abs() < f32::EPSILON);
        assert_eq!(prompt.options.max_tokens, 300);
    }

    #[test]
    fn test_long_chunk_excerpt_is_clamped() {
        let long = "y".repeat(2000);
        let context = vec![scored("long", &long, 0.9)];
        let prompt = composer(6000).compose(&question("eggs?"), &general_persona(), &context);
        assert!(prompt.text.contains("..."));
        assert!(!prompt.text.contains(&"y".repeat(601)));
    }
}
