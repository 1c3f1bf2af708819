//! Document pruning strategies.
//!
//! A pruner consumes a candidate document list and returns a reduced list
//! that fits its token budget, together with a record of everything it
//! discarded. Two strategies exist:
//!
//! - [`DeletePruner`] — keep whole documents in importance order, drop the
//!   tail.
//! - [`ExtractPruner`] — keep small documents whole and replace oversized
//!   ones with oracle-selected excerpts, dispatched concurrently.
//!
//! History pruning is a pure function in [`history`] rather than a trait
//! implementation: it has exactly one behavior.

pub mod delete;
pub mod extract;
pub mod history;

use async_trait::async_trait;
use promptfit_core::document::Document;
use promptfit_core::error::PruneError;
use promptfit_core::message::Message;
use serde::{Deserialize, Serialize};

pub use delete::DeletePruner;
pub use extract::{ExtractOptions, ExtractPruner};
pub use history::{HistoryOutcome, prune_history};

/// Why a document did not make it into the final context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// The document (or its excerpt) did not fit the remaining budget.
    OverBudget,
    /// The oracle judged nothing in the document relevant.
    NothingRelevant,
    /// The oracle call or response parsing failed.
    OracleFailed(String),
    /// The oracle call exceeded the per-task deadline.
    TimedOut,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OverBudget => write!(f, "over budget"),
            Self::NothingRelevant => write!(f, "nothing relevant"),
            Self::OracleFailed(e) => write!(f, "oracle failed: {e}"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// One discarded document, for the operator-facing report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropRecord {
    /// Which document.
    pub identifier: String,
    /// Token cost of what was discarded.
    pub tokens_dropped: usize,
    /// Why it was discarded.
    pub reason: DropReason,
}

/// The result of a document pruning pass.
#[derive(Debug, Clone, Default)]
pub struct PruneOutput {
    /// Documents that fit the budget. Never contains empty-content
    /// documents.
    pub documents: Vec<Document>,
    /// Everything that was discarded, and why.
    pub drops: Vec<DropRecord>,
}

/// A document pruning strategy.
#[async_trait]
pub trait DocumentPruner: Send + Sync {
    /// Reduce `documents` to a list fitting this pruner's budget.
    ///
    /// The input is assumed pre-sorted by importance (most important
    /// first); that ordering is the retrieval collaborator's contract.
    async fn prune(
        &self,
        documents: Vec<Document>,
        conversation: &[Message],
    ) -> Result<PruneOutput, PruneError>;
}

/// Reject non-positive budgets at the component boundary.
pub(crate) fn require_positive_budget(budget: usize) -> Result<usize, PruneError> {
    if budget == 0 {
        return Err(PruneError::InvalidBudget { budget });
    }
    Ok(budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_rejected() {
        assert!(matches!(
            require_positive_budget(0),
            Err(PruneError::InvalidBudget { budget: 0 })
        ));
        assert_eq!(require_positive_budget(1).unwrap(), 1);
    }

    #[test]
    fn drop_reason_displays() {
        assert_eq!(DropReason::OverBudget.to_string(), "over budget");
        assert!(
            DropReason::OracleFailed("boom".into())
                .to_string()
                .contains("boom")
        );
    }
}
