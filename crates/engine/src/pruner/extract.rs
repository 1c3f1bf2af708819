//! The extract strategy: replace oversized documents with oracle-selected
//! excerpts, dispatched concurrently against a bounded worker pool.
//!
//! Pipeline per [`ExtractPruner::prune`]:
//!
//! 1. Partition — a running tracker admits documents whole while their
//!    aggregate stays under `budget * small_file_threshold`; the rest go
//!    through extraction.
//! 2. Concurrent dispatch — one task per oversized document, bounded
//!    fan-out, per-task deadline. A task is a pure function over its own
//!    document and the shared read-only conversation.
//! 3. Aggregation — each task yields `Result`-like [`ExtractOutcome`];
//!    failures degrade that one document to empty content, never the batch.
//! 4. Deterministic bin-pack — excerpts sorted by ascending new token cost
//!    (stable on submission order) are accumulated into what the kept-whole
//!    set left of the budget.
//!
//! Completion order of the workers never affects the output.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use promptfit_config::ExtractMode;
use promptfit_core::counter::TokenCounter;
use promptfit_core::document::Document;
use promptfit_core::error::{OracleError, PruneError};
use promptfit_core::message::Message;
use promptfit_core::oracle::{RelevanceOracle, ScoredSnippet};
use tracing::{debug, info, warn};

use crate::ranges::{build_range_content, merge_ranges, number_lines};

use super::{DocumentPruner, DropReason, DropRecord, PruneOutput, require_positive_budget};

/// Tuning knobs for the extract strategy.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Which oracle variant to use.
    pub mode: ExtractMode,
    /// Worker pool width for concurrent extraction.
    pub workers: usize,
    /// Fraction of the budget under which documents are kept whole.
    pub small_file_threshold: f64,
    /// Minimum snippet score kept by the scoring variant.
    pub score_threshold: u8,
    /// Per-document oracle deadline.
    pub task_timeout: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Ranges,
            workers: 8,
            small_file_threshold: 0.8,
            score_threshold: 5,
            task_timeout: Duration::from_secs(30),
        }
    }
}

/// What a single extraction task produced.
///
/// `Empty` (oracle said nothing is relevant) and `Failed` both degrade to
/// an absent document downstream, but the distinction is kept explicit for
/// the report.
enum ExtractOutcome {
    Extracted(Document),
    Empty,
    Failed(OracleError),
}

pub struct ExtractPruner {
    max_tokens: usize,
    threshold_tokens: usize,
    oracle: Arc<dyn RelevanceOracle>,
    counter: Arc<dyn TokenCounter>,
    options: ExtractOptions,
}

impl ExtractPruner {
    pub fn new(
        max_tokens: usize,
        oracle: Arc<dyn RelevanceOracle>,
        counter: Arc<dyn TokenCounter>,
        options: ExtractOptions,
    ) -> Result<Self, PruneError> {
        let max_tokens = require_positive_budget(max_tokens)?;
        let threshold_tokens = (max_tokens as f64 * options.small_file_threshold) as usize;
        Ok(Self {
            max_tokens,
            threshold_tokens,
            oracle,
            counter,
            options,
        })
    }

    /// Run one extraction task: oracle call plus excerpt reconstruction.
    async fn extract_one(&self, doc: &Document, conversation: &[Message]) -> ExtractOutcome {
        let result = match self.options.mode {
            ExtractMode::Ranges => self.extract_by_ranges(doc, conversation).await,
            ExtractMode::Scoring => self.extract_by_scores(doc, conversation).await,
        };
        match result {
            Ok(Some(content)) => ExtractOutcome::Extracted(Document::new(&doc.identifier, content)),
            Ok(None) => ExtractOutcome::Empty,
            Err(e) => ExtractOutcome::Failed(e),
        }
    }

    async fn extract_by_ranges(
        &self,
        doc: &Document,
        conversation: &[Message],
    ) -> Result<Option<String>, OracleError> {
        let numbered = number_lines(&doc.content);
        let ranges = self.oracle.extract_ranges(conversation, &numbered).await?;
        if ranges.is_empty() {
            return Ok(None);
        }
        let merged = merge_ranges(ranges);
        Ok(Some(build_range_content(&doc.content, &merged)))
    }

    async fn extract_by_scores(
        &self,
        doc: &Document,
        conversation: &[Message],
    ) -> Result<Option<String>, OracleError> {
        let snippets = self
            .oracle
            .extract_snippets(conversation, &doc.content)
            .await?;

        let threshold = self.options.score_threshold;
        let mut survivors: Vec<ScoredSnippet> = snippets
            .into_iter()
            .filter(|s| s.score >= threshold)
            .collect();
        if survivors.is_empty() {
            return Ok(None);
        }
        // Highest-scored content first.
        survivors.sort_by(|a, b| b.score.cmp(&a.score));

        let mut content = format!(
            "# Highly relevant snippets from {} (filtered by score >= {}):\n",
            doc.identifier, threshold
        );
        for snippet in &survivors {
            content.push_str(&format!(
                "\n# Relevance Score: {}\n---\n{}\n",
                snippet.score, snippet.snippet
            ));
        }
        Ok(Some(content))
    }
}

#[async_trait]
impl DocumentPruner for ExtractPruner {
    async fn prune(
        &self,
        documents: Vec<Document>,
        conversation: &[Message],
    ) -> Result<PruneOutput, PruneError> {
        // --- Step 1: partition against the running threshold tracker ---
        let mut kept_whole: Vec<Document> = Vec::new();
        let mut oversized: Vec<Document> = Vec::new();
        let mut whole_tokens = 0usize;

        for doc in documents {
            let tokens = doc.tokens(self.counter.as_ref());
            if whole_tokens + tokens <= self.threshold_tokens {
                whole_tokens += tokens;
                kept_whole.push(doc);
            } else {
                oversized.push(doc);
            }
        }

        info!(
            kept_whole = kept_whole.len(),
            to_extract = oversized.len(),
            whole_tokens,
            workers = self.options.workers,
            "Extract pruning: partitioned document pool"
        );

        // --- Step 2: concurrent dispatch with bounded fan-out ---
        let timeout = self.options.task_timeout;
        let mut outcomes: Vec<(usize, Document, ExtractOutcome)> =
            stream::iter(oversized.into_iter().enumerate())
                .map(|(index, doc)| async move {
                    debug!(identifier = %doc.identifier, "Starting snippet extraction");
                    let outcome =
                        match tokio::time::timeout(timeout, self.extract_one(&doc, conversation))
                            .await
                        {
                            Ok(outcome) => outcome,
                            Err(_) => ExtractOutcome::Failed(OracleError::Timeout {
                                timeout_secs: timeout.as_secs(),
                            }),
                        };
                    (index, doc, outcome)
                })
                .buffer_unordered(self.options.workers.max(1))
                .collect()
                .await;

        // Completion order is nondeterministic; restore submission order
        // before the bin-pack so the result never depends on scheduling.
        outcomes.sort_by_key(|(index, _, _)| *index);

        // --- Step 3: aggregate, degrading failures per document ---
        let mut drops: Vec<DropRecord> = Vec::new();
        let mut extracted: Vec<Document> = Vec::new();

        for (_, original, outcome) in outcomes {
            match outcome {
                ExtractOutcome::Extracted(doc) => extracted.push(doc),
                ExtractOutcome::Empty => {
                    debug!(identifier = %original.identifier, "No relevant content found");
                    let tokens_dropped = original.tokens(self.counter.as_ref());
                    drops.push(DropRecord {
                        identifier: original.identifier,
                        tokens_dropped,
                        reason: DropReason::NothingRelevant,
                    });
                }
                ExtractOutcome::Failed(e) => {
                    warn!(
                        identifier = %original.identifier,
                        error = %e,
                        "Extraction failed, degrading document to empty content"
                    );
                    let reason = match e {
                        OracleError::Timeout { .. } => DropReason::TimedOut,
                        other => DropReason::OracleFailed(other.to_string()),
                    };
                    let tokens_dropped = original.tokens(self.counter.as_ref());
                    drops.push(DropRecord {
                        identifier: original.identifier,
                        tokens_dropped,
                        reason,
                    });
                }
            }
        }

        // --- Step 4: deterministic bin-pack of the excerpts ---
        // Ascending new cost, stable on submission order for equal costs.
        extracted.sort_by_key(|doc| doc.tokens(self.counter.as_ref()));

        let mut packed_tokens = whole_tokens;
        let mut final_documents = kept_whole;
        for doc in extracted {
            let tokens = doc.tokens(self.counter.as_ref());
            if packed_tokens + tokens <= self.max_tokens {
                debug!(identifier = %doc.identifier, tokens, "Accepted extracted excerpt");
                packed_tokens += tokens;
                final_documents.push(doc);
            } else {
                debug!(identifier = %doc.identifier, tokens, "Excerpt too large to fit, discarding");
                drops.push(DropRecord {
                    identifier: doc.identifier,
                    tokens_dropped: tokens,
                    reason: DropReason::OverBudget,
                });
            }
        }

        info!(
            kept = final_documents.len(),
            dropped = drops.len(),
            tokens = packed_tokens,
            "Extract pruning complete"
        );
        Ok(PruneOutput {
            documents: final_documents,
            drops,
        })
    }
}
