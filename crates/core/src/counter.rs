//! The token counting seam.
//!
//! The engine never interprets tokenization internals; it only asks an
//! injected [`TokenCounter`] how many tokens a piece of text costs. Real
//! implementations live in `promptfit-tokens`.

/// Counts tokens for a given piece of text.
///
/// Implementations must be pure and deterministic: the same text always
/// yields the same count for the same counter instance.
pub trait TokenCounter: Send + Sync {
    /// Count the tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}
