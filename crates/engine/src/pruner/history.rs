//! Conversation history pruning — newest-first suffix retention.
//!
//! Pure function of its inputs: no side effects, message order preserved
//! exactly, messages are never split.

use promptfit_core::counter::TokenCounter;
use promptfit_core::message::Message;
use promptfit_tokens::count_message;
use tracing::{debug, warn};

/// Result of a history pruning pass.
#[derive(Debug, Clone)]
pub struct HistoryOutcome {
    /// Retained messages, in original chronological order.
    pub messages: Vec<Message>,
    /// Tokens consumed by the retained messages.
    pub tokens: usize,
    /// Number of messages dropped.
    pub dropped: usize,
    /// Token cost of the dropped messages.
    pub dropped_tokens: usize,
}

/// Retain the newest messages that fit under `budget`.
///
/// Walks newest to oldest, greedily accumulating cost. A message that
/// merely overflows the remaining budget stops the walk — everything older
/// is dropped too. A message whose own cost exceeds the *entire* budget is
/// dropped whole (never split) and the walk continues with the next-newest;
/// losing a recent oversized message is visible to the user, but splitting
/// mid-message risks incoherent dialogue.
pub fn prune_history(
    messages: &[Message],
    budget: usize,
    counter: &dyn TokenCounter,
) -> HistoryOutcome {
    let mut retained: Vec<Message> = Vec::new();
    let mut used = 0usize;
    let mut dropped = 0usize;
    let mut dropped_tokens = 0usize;
    let mut stopped = false;

    for msg in messages.iter().rev() {
        if stopped {
            dropped += 1;
            dropped_tokens += count_message(counter, msg);
            continue;
        }

        let cost = count_message(counter, msg);
        if used + cost <= budget {
            retained.push(msg.clone());
            used += cost;
        } else if cost > budget {
            warn!(
                role = %msg.role,
                tokens = cost,
                budget,
                "Message alone exceeds the history budget, dropping it whole"
            );
            dropped += 1;
            dropped_tokens += cost;
        } else {
            stopped = true;
            dropped += 1;
            dropped_tokens += cost;
        }
    }

    // Restore chronological order.
    retained.reverse();

    if dropped > 0 {
        debug!(
            kept = retained.len(),
            dropped, dropped_tokens, "History pruned"
        );
    }

    HistoryOutcome {
        messages: retained,
        tokens: used,
        dropped,
        dropped_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptfit_tokens::MESSAGE_OVERHEAD_TOKENS;

    /// Counter that charges one token per character, making message costs
    /// easy to script via content length.
    struct CharCounter;

    impl TokenCounter for CharCounter {
        fn count(&self, text: &str) -> usize {
            text.len()
        }
    }

    fn msg_with_cost(cost: usize) -> Message {
        // count_message adds the fixed overhead, subtract it from content.
        Message::user("x".repeat(cost - MESSAGE_OVERHEAD_TOKENS))
    }

    #[test]
    fn everything_fits_nothing_dropped() {
        let messages = vec![msg_with_cost(10), msg_with_cost(10)];
        let outcome = prune_history(&messages, 100, &CharCounter);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.tokens, 20);
    }

    #[test]
    fn newest_messages_retained_first() {
        // oldest → newest costs: 10, 20, 5, 8 with budget 15
        let messages = vec![
            msg_with_cost(10),
            msg_with_cost(20),
            msg_with_cost(5),
            msg_with_cost(8),
        ];
        let outcome = prune_history(&messages, 15, &CharCounter);
        // 8 fits (8), 5 fits (13), 20 exceeds the whole budget → dropped,
        // 10 overflows the remainder → stop
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].content.len() + MESSAGE_OVERHEAD_TOKENS, 5);
        assert_eq!(outcome.messages[1].content.len() + MESSAGE_OVERHEAD_TOKENS, 8);
        assert_eq!(outcome.dropped, 2);
    }

    #[test]
    fn order_is_chronological() {
        let messages = vec![Message::user("first"), Message::assistant("second")];
        let outcome = prune_history(&messages, 1000, &CharCounter);
        assert_eq!(outcome.messages[0].content, "first");
        assert_eq!(outcome.messages[1].content, "second");
    }

    #[test]
    fn oversized_newest_message_dropped_next_tried() {
        // oldest → newest costs: 10, 20, 5, 50 with budget 30
        let messages = vec![
            msg_with_cost(10),
            msg_with_cost(20),
            msg_with_cost(5),
            msg_with_cost(50),
        ];
        let outcome = prune_history(&messages, 30, &CharCounter);
        // 50 > 30 entirely → dropped whole, walk continues:
        // 5 fits (5), 20 fits (25), 10 overflows remaining → stop
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].content.len() + MESSAGE_OVERHEAD_TOKENS, 20);
        assert_eq!(outcome.messages[1].content.len() + MESSAGE_OVERHEAD_TOKENS, 5);
        assert_eq!(outcome.dropped, 2);
        assert_eq!(outcome.dropped_tokens, 60);
    }

    #[test]
    fn overflow_within_budget_stops_the_walk() {
        // Once an in-budget message overflows the remainder, older messages
        // are not considered even if they would fit.
        let messages = vec![msg_with_cost(5), msg_with_cost(25), msg_with_cost(8)];
        let outcome = prune_history(&messages, 30, &CharCounter);
        // 8 fits (8), 25 overflows remaining (but 25 < 30) → stop; 5 never tried
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.dropped, 2);
    }

    #[test]
    fn empty_history() {
        let outcome = prune_history(&[], 100, &CharCounter);
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.tokens, 0);
    }

    #[test]
    fn zero_budget_drops_everything() {
        let messages = vec![msg_with_cost(5), msg_with_cost(6)];
        let outcome = prune_history(&messages, 0, &CharCounter);
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.dropped, 2);
    }
}
