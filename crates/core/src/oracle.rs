//! The relevance oracle seam and its wire types.
//!
//! The oracle is an external, fallible judge (backed by a language model)
//! that decides which parts of a document matter for the current
//! conversation. The engine treats it as a black box: malformed or failing
//! responses must never propagate past the per-document task boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::message::Message;

/// A 1-based, inclusive line range inside a source document.
///
/// Serde field names match the oracle wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl LineRange {
    /// Create a validated range. Rejects `start > end` and 0-based input.
    pub fn new(start_line: usize, end_line: usize) -> Result<Self, OracleError> {
        if start_line == 0 || start_line > end_line {
            return Err(OracleError::InvalidRange {
                start_line,
                end_line,
            });
        }
        Ok(Self {
            start_line,
            end_line,
        })
    }

    /// Validate an already-deserialized range.
    pub fn validate(&self) -> Result<(), OracleError> {
        Self::new(self.start_line, self.end_line).map(|_| ())
    }
}

/// A text snippet judged relevant by the oracle, with a 0–10 score.
///
/// Score 0 means irrelevant, 10 highly relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredSnippet {
    pub score: u8,
    pub snippet: String,
}

/// The external relevance-judging call.
///
/// Two variants exist: a line-range variant fed numbered content, and a
/// scoring variant fed the raw content. Both return at most 4 items; an
/// empty list means "nothing relevant". Implementations are remote calls
/// and may fail — callers own the degradation policy.
#[async_trait]
pub trait RelevanceOracle: Send + Sync {
    /// Judge which line ranges of `numbered_content` are relevant to the
    /// conversation.
    async fn extract_ranges(
        &self,
        conversation: &[Message],
        numbered_content: &str,
    ) -> Result<Vec<LineRange>, OracleError>;

    /// Extract scored snippets from `content` relevant to the conversation.
    async fn extract_snippets(
        &self,
        conversation: &[Message],
        content: &str,
    ) -> Result<Vec<ScoredSnippet>, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range_accepted() {
        let r = LineRange::new(3, 9).unwrap();
        assert_eq!(r.start_line, 3);
        assert_eq!(r.end_line, 9);
    }

    #[test]
    fn inverted_range_rejected() {
        let err = LineRange::new(10, 2).unwrap_err();
        assert!(matches!(err, OracleError::InvalidRange { .. }));
    }

    #[test]
    fn zero_based_range_rejected() {
        assert!(LineRange::new(0, 5).is_err());
    }

    #[test]
    fn single_line_range_is_valid() {
        assert!(LineRange::new(7, 7).is_ok());
    }

    #[test]
    fn range_deserializes_from_wire_format() {
        let r: LineRange = serde_json::from_str(r#"{"start_line": 10, "end_line": 25}"#).unwrap();
        assert_eq!(r, LineRange::new(10, 25).unwrap());
    }

    #[test]
    fn snippet_deserializes_from_wire_format() {
        let s: ScoredSnippet =
            serde_json::from_str(r#"{"score": 9, "snippet": "fn main() {}"}"#).unwrap();
        assert_eq!(s.score, 9);
        assert_eq!(s.snippet, "fn main() {}");
    }
}
