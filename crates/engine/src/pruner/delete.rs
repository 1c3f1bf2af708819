//! The delete strategy: keep whole documents in importance order.

use std::sync::Arc;

use async_trait::async_trait;
use promptfit_core::counter::TokenCounter;
use promptfit_core::document::Document;
use promptfit_core::error::PruneError;
use promptfit_core::message::Message;
use tracing::{debug, info};

use super::{DocumentPruner, DropReason, DropRecord, PruneOutput, require_positive_budget};

/// Greedily accumulates documents whole, in the caller's importance order,
/// until the next one would exceed the budget. No partial inclusion: the
/// first document that overflows ends the scan and everything after it is
/// dropped.
pub struct DeletePruner {
    max_tokens: usize,
    counter: Arc<dyn TokenCounter>,
}

impl DeletePruner {
    pub fn new(max_tokens: usize, counter: Arc<dyn TokenCounter>) -> Result<Self, PruneError> {
        Ok(Self {
            max_tokens: require_positive_budget(max_tokens)?,
            counter,
        })
    }
}

#[async_trait]
impl DocumentPruner for DeletePruner {
    async fn prune(
        &self,
        documents: Vec<Document>,
        _conversation: &[Message],
    ) -> Result<PruneOutput, PruneError> {
        let mut kept: Vec<Document> = Vec::new();
        let mut drops: Vec<DropRecord> = Vec::new();
        let mut used = 0usize;
        let mut overflowed = false;

        for doc in documents {
            let tokens = doc.tokens(self.counter.as_ref());
            if !overflowed && used + tokens <= self.max_tokens {
                used += tokens;
                kept.push(doc);
            } else {
                if !overflowed {
                    debug!(
                        identifier = %doc.identifier,
                        "Token limit reached, discarding remaining documents"
                    );
                    overflowed = true;
                }
                drops.push(DropRecord {
                    identifier: doc.identifier,
                    tokens_dropped: tokens,
                    reason: DropReason::OverBudget,
                });
            }
        }

        info!(
            kept = kept.len(),
            dropped = drops.len(),
            tokens = used,
            "Delete pruning complete"
        );
        Ok(PruneOutput {
            documents: kept,
            drops,
        })
    }
}
