//! The Document value object — a single candidate for context inclusion.
//!
//! A `Document` is immutable once constructed: pruning never rewrites a
//! document in place, it produces a *new* `Document` holding the reduced
//! content. The token cost is computed lazily through an injected
//! [`TokenCounter`] and cached for the lifetime of the value.

use std::sync::OnceLock;

use crate::counter::TokenCounter;

/// A candidate reference document (source file or text chunk).
#[derive(Debug, Clone)]
pub struct Document {
    /// Path or chunk identifier.
    pub identifier: String,

    /// The full text content.
    pub content: String,

    /// Cached token cost; computed on first use.
    tokens: OnceLock<usize>,
}

impl Document {
    /// Create a document whose token cost will be computed lazily.
    pub fn new(identifier: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            content: content.into(),
            tokens: OnceLock::new(),
        }
    }

    /// Create a document with a precomputed token cost.
    pub fn with_tokens(
        identifier: impl Into<String>,
        content: impl Into<String>,
        tokens: usize,
    ) -> Self {
        let doc = Self::new(identifier, content);
        let _ = doc.tokens.set(tokens);
        doc
    }

    /// The token cost of this document's content, computed once and cached.
    pub fn tokens(&self, counter: &dyn TokenCounter) -> usize {
        *self.tokens.get_or_init(|| counter.count(&self.content))
    }

    /// Whether the content is empty (an empty document is effectively
    /// dropped downstream).
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of lines in the content.
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}
