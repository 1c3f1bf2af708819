//! Heuristic token estimation.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text, and is the fallback whenever no real tokenizer is registered
//! for a model.

use promptfit_core::counter::TokenCounter;
use promptfit_core::message::Message;

/// Per-message overhead for role name, delimiters, and formatting markers
/// in the API wire format.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Character-heuristic counter: 1 token ≈ 4 characters, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        (text.len() + 3) / 4
    }
}

/// Token cost of a single message including per-message overhead.
pub fn count_message(counter: &dyn TokenCounter, message: &Message) -> usize {
    MESSAGE_OVERHEAD_TOKENS + counter.count(&message.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        assert_eq!(HeuristicCounter.count(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(HeuristicCounter.count("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up() {
        assert_eq!(HeuristicCounter.count("hello"), 2);
    }

    #[test]
    fn hundred_chars() {
        let text = "a".repeat(100);
        assert_eq!(HeuristicCounter.count(&text), 25);
    }

    #[test]
    fn message_includes_overhead() {
        let msg = Message::user("test"); // 4 chars → 1 token + 4 overhead = 5
        assert_eq!(count_message(&HeuristicCounter, &msg), 5);
    }
}
