//! Context assembly orchestration.
//!
//! [`ContextBuilder`] ties the pipeline together: count the system prompt,
//! split the safe zone, prune history and documents concurrently, then emit
//! the final message list plus an [`AssemblyReport`] describing everything
//! that was cut.

use std::sync::Arc;
use std::time::Duration;

use promptfit_config::{ContextConfig, PruneStrategy};
use promptfit_core::counter::TokenCounter;
use promptfit_core::document::Document;
use promptfit_core::error::{BudgetError, Error, Result};
use promptfit_core::message::Message;
use promptfit_core::oracle::RelevanceOracle;
use promptfit_tokens::TokenizerRegistry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::budget::{BudgetAllocation, TaskProfile};
use crate::pruner::{
    DeletePruner, DocumentPruner, DropReason, DropRecord, ExtractOptions, ExtractPruner,
    PruneOutput, prune_history,
};

/// Appended to a system prompt that had to be cut down to fit.
pub const TRUNCATION_WARNING: &str =
    "\n\n[---SYSTEM WARNING: This content has been truncated due to context window limitations.---]";

/// Operator-facing account of one assembly pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyReport {
    /// The computed budget split. Absent when assembly degraded before the
    /// split could be made.
    pub allocation: Option<BudgetAllocation>,
    pub history_kept: usize,
    pub history_total: usize,
    pub history_tokens: usize,
    pub documents_kept: usize,
    pub documents_total: usize,
    pub document_tokens: usize,
    /// Every discarded document, with the reason.
    pub drops: Vec<DropRecord>,
    /// True when the system prompt alone overflowed the safe zone and the
    /// output is a single truncated system message.
    pub degraded: bool,
}

/// What [`ContextBuilder::build`] returns: a ready-to-send message list and
/// the report explaining how it was produced.
#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub messages: Vec<Message>,
    pub report: AssemblyReport,
}

/// Orchestrates context assembly under a fixed window size.
pub struct ContextBuilder {
    config: ContextConfig,
    counter: Arc<dyn TokenCounter>,
    oracle: Option<Arc<dyn RelevanceOracle>>,
}

impl std::fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContextBuilder {
    /// The extract strategy needs an oracle; pass `None` only with the
    /// delete strategy.
    pub fn new(
        config: ContextConfig,
        counter: Arc<dyn TokenCounter>,
        oracle: Option<Arc<dyn RelevanceOracle>>,
    ) -> Result<Self> {
        config.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        if config.strategy == PruneStrategy::Extract && oracle.is_none() {
            return Err(Error::Config {
                message: "extract strategy requires a relevance oracle".to_string(),
            });
        }
        Ok(Self {
            config,
            counter,
            oracle,
        })
    }

    /// Construct with the counter resolved from `config.model` through the
    /// registry (heuristic fallback when no tokenizer is registered).
    pub fn with_registry(
        config: ContextConfig,
        registry: &TokenizerRegistry,
        oracle: Option<Arc<dyn RelevanceOracle>>,
    ) -> Result<Self> {
        let counter = registry.counter(&config.model);
        Self::new(config, counter, oracle)
    }

    /// Tokens usable for context, leaving headroom for the response.
    pub fn safe_zone(&self) -> usize {
        (self.config.max_window_size as f64 * self.config.safe_zone_fraction) as usize
    }

    /// Assemble `[system] + [document wrapper] + [pruned history]` under the
    /// safe zone.
    ///
    /// `documents` must arrive pre-sorted by importance. An oversized system
    /// prompt does not fail the call: assembly degrades to a single truncated
    /// system message and flags the report.
    pub async fn build(
        &self,
        system_prompt: &str,
        conversation: &[Message],
        documents: Vec<Document>,
    ) -> Result<BuiltContext> {
        let safe_zone = self.safe_zone();
        let system_prompt_tokens = self.counter.count(system_prompt);
        let profile = TaskProfile::for_task(self.config.task_type);

        let allocation =
            match BudgetAllocation::compute(safe_zone, system_prompt_tokens, profile) {
                Ok(allocation) => allocation,
                Err(BudgetError::SystemPromptTooLarge { .. }) => {
                    warn!(
                        system_prompt_tokens,
                        safe_zone, "System prompt exceeds the safe zone, degrading to truncation"
                    );
                    return Ok(self.degraded_context(
                        system_prompt,
                        system_prompt_tokens,
                        safe_zone,
                        conversation.len(),
                        documents.len(),
                    ));
                }
                Err(e) => return Err(e.into()),
            };

        info!(
            history_budget = allocation.history_budget,
            document_budget = allocation.document_budget,
            system_prompt_tokens,
            task = ?self.config.task_type,
            "Computed context budget"
        );

        // The two pruning paths share no mutable state.
        let history_path = async {
            prune_history(conversation, allocation.history_budget, self.counter.as_ref())
        };
        let document_path = self.prune_documents(documents, conversation, allocation);
        let (history, prune_result) = tokio::join!(history_path, document_path);
        let pruned = prune_result?;

        let document_tokens: usize = pruned
            .documents
            .iter()
            .map(|d| d.tokens(self.counter.as_ref()))
            .sum();

        let report = AssemblyReport {
            allocation: Some(allocation),
            history_kept: history.messages.len(),
            history_total: conversation.len(),
            history_tokens: history.tokens,
            documents_kept: pruned.documents.len(),
            documents_total: pruned.documents.len() + pruned.drops.len(),
            document_tokens,
            drops: pruned.drops,
            degraded: false,
        };

        let mut messages = vec![Message::system(system_prompt)];
        if !pruned.documents.is_empty() {
            messages.push(Message::assistant(wrap_documents(&pruned.documents)));
        }
        messages.extend(history.messages);

        info!(
            messages = messages.len(),
            history_kept = report.history_kept,
            documents_kept = report.documents_kept,
            dropped = report.drops.len(),
            "Context assembled"
        );
        Ok(BuiltContext { messages, report })
    }

    async fn prune_documents(
        &self,
        documents: Vec<Document>,
        conversation: &[Message],
        allocation: BudgetAllocation,
    ) -> Result<PruneOutput> {
        if documents.is_empty() {
            return Ok(PruneOutput::default());
        }
        // A zero document budget cannot admit anything; record the drops
        // without constructing a pruner.
        if allocation.document_budget == 0 {
            let drops = documents
                .into_iter()
                .map(|doc| {
                    let tokens = doc.tokens(self.counter.as_ref());
                    DropRecord {
                        identifier: doc.identifier,
                        tokens_dropped: tokens,
                        reason: DropReason::OverBudget,
                    }
                })
                .collect();
            return Ok(PruneOutput {
                documents: Vec::new(),
                drops,
            });
        }

        let pruner: Box<dyn DocumentPruner> = match self.config.strategy {
            PruneStrategy::Delete => Box::new(DeletePruner::new(
                allocation.document_budget,
                Arc::clone(&self.counter),
            )?),
            PruneStrategy::Extract => {
                let oracle = self.oracle.clone().ok_or_else(|| Error::Config {
                    message: "extract strategy requires a relevance oracle".to_string(),
                })?;
                Box::new(ExtractPruner::new(
                    allocation.document_budget,
                    oracle,
                    Arc::clone(&self.counter),
                    ExtractOptions {
                        mode: self.config.extract_mode,
                        workers: self.config.worker_pool,
                        small_file_threshold: self.config.small_file_threshold,
                        score_threshold: self.config.score_threshold,
                        task_timeout: Duration::from_secs(self.config.oracle_timeout_secs),
                    },
                )?)
            }
        };
        Ok(pruner.prune(documents, conversation).await?)
    }

    fn degraded_context(
        &self,
        system_prompt: &str,
        system_prompt_tokens: usize,
        safe_zone: usize,
        history_total: usize,
        documents_total: usize,
    ) -> BuiltContext {
        let truncated = truncate_to_budget(system_prompt, system_prompt_tokens, safe_zone);
        let report = AssemblyReport {
            allocation: None,
            history_kept: 0,
            history_total,
            history_tokens: 0,
            documents_kept: 0,
            documents_total,
            document_tokens: 0,
            drops: Vec::new(),
            degraded: true,
        };
        BuiltContext {
            messages: vec![Message::system(truncated)],
            report,
        }
    }
}

/// The document wrapper the assistant message carries.
fn wrap_documents(documents: &[Document]) -> String {
    let body = documents
        .iter()
        .map(|d| format!("File: {}\n\n{}", d.identifier, d.content))
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!("<CONTEXT_FILES>\n{body}\n</CONTEXT_FILES>")
}

/// Cut a prompt to roughly `budget` tokens using its own observed
/// chars-per-token ratio, with a 5% margin, and append the warning marker.
fn truncate_to_budget(prompt: &str, prompt_tokens: usize, budget: usize) -> String {
    let avg_chars_per_token = if prompt_tokens > 0 {
        prompt.len() as f64 / prompt_tokens as f64
    } else {
        4.0
    };
    let safe_chars = (budget as f64 * avg_chars_per_token * 0.95) as usize;
    let mut cut = safe_chars.min(prompt.len());
    while cut > 0 && !prompt.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &prompt[..cut], TRUNCATION_WARNING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptfit_config::TaskType;
    use promptfit_core::message::Role;

    struct CharCounter;

    impl TokenCounter for CharCounter {
        fn count(&self, text: &str) -> usize {
            text.len()
        }
    }

    fn delete_config(max_window: usize) -> ContextConfig {
        ContextConfig {
            max_window_size: max_window,
            strategy: PruneStrategy::Delete,
            ..ContextConfig::default()
        }
    }

    fn builder(config: ContextConfig) -> ContextBuilder {
        ContextBuilder::new(config, Arc::new(CharCounter), None).unwrap()
    }

    #[tokio::test]
    async fn assembles_in_canonical_order() {
        let b = builder(delete_config(10_000));
        let conversation = vec![Message::user("hello"), Message::assistant("hi")];
        let docs = vec![Document::new("main.rs", "fn main() {}")];

        let built = b.build("You are helpful.", &conversation, docs).await.unwrap();

        assert_eq!(built.messages[0].role, Role::System);
        assert_eq!(built.messages[0].content, "You are helpful.");
        assert_eq!(built.messages[1].role, Role::Assistant);
        assert!(built.messages[1].content.starts_with("<CONTEXT_FILES>\n"));
        assert!(built.messages[1].content.ends_with("\n</CONTEXT_FILES>"));
        assert!(built.messages[1].content.contains("File: main.rs\n\nfn main() {}"));
        assert_eq!(built.messages[2].content, "hello");
        assert_eq!(built.messages[3].content, "hi");
        assert!(!built.report.degraded);
    }

    #[tokio::test]
    async fn wrapper_joins_documents_with_separator() {
        let docs = vec![
            Document::new("a.rs", "aaa"),
            Document::new("b.rs", "bbb"),
        ];
        let wrapped = wrap_documents(&docs);
        assert_eq!(
            wrapped,
            "<CONTEXT_FILES>\nFile: a.rs\n\naaa\n---\nFile: b.rs\n\nbbb\n</CONTEXT_FILES>"
        );
    }

    #[tokio::test]
    async fn no_wrapper_when_all_documents_dropped() {
        // Window 100 → safe zone 90; prompt costs 50; default split leaves
        // a 24-token document budget, too small for this document.
        let b = builder(delete_config(100));
        let docs = vec![Document::new("big.rs", "x".repeat(500))];

        let built = b.build(&"s".repeat(50), &[], docs).await.unwrap();

        assert_eq!(built.messages.len(), 1);
        assert_eq!(built.messages[0].role, Role::System);
        assert_eq!(built.report.documents_kept, 0);
        assert_eq!(built.report.drops.len(), 1);
        assert_eq!(built.report.drops[0].reason, DropReason::OverBudget);
    }

    #[tokio::test]
    async fn oversized_system_prompt_degrades_instead_of_failing() {
        let b = builder(delete_config(100));
        let prompt = "p".repeat(500);
        let conversation = vec![Message::user("lost")];
        let docs = vec![Document::new("lost.rs", "gone")];

        let built = b.build(&prompt, &conversation, docs).await.unwrap();

        assert!(built.report.degraded);
        assert!(built.report.allocation.is_none());
        assert_eq!(built.messages.len(), 1);
        assert_eq!(built.messages[0].role, Role::System);
        assert!(built.messages[0].content.ends_with(TRUNCATION_WARNING));
        // 1 char per token here: 90 * 1.0 * 0.95 = 85 chars survive.
        assert!(built.messages[0].content.len() < 500);
    }

    #[tokio::test]
    async fn report_reflects_history_pruning() {
        // Safe zone 90, prompt 10 → remaining 80; default 0.40 → history
        // budget 32. Messages cost content + 4 overhead each.
        let b = builder(delete_config(100));
        let conversation = vec![
            Message::user("o".repeat(40)), // 44 exceeds the whole budget → dropped
            Message::user("n".repeat(10)), // 14
            Message::user("m".repeat(10)), // 14
        ];

        let built = b.build(&"s".repeat(10), &conversation, vec![]).await.unwrap();

        assert_eq!(built.report.history_total, 3);
        assert_eq!(built.report.history_kept, 2);
        assert_eq!(built.report.history_tokens, 28);
        // system + two retained messages, no wrapper
        assert_eq!(built.messages.len(), 3);
    }

    #[tokio::test]
    async fn chat_profile_splits_toward_history() {
        let mut config = delete_config(1112); // safe zone 1000
        config.task_type = TaskType::Chat;
        let b = builder(config);

        let built = b.build(&"s".repeat(100), &[], vec![]).await.unwrap();
        let allocation = built.report.allocation.unwrap();
        assert_eq!(allocation.history_budget, 630);
        assert_eq!(allocation.document_budget, 270);
    }

    #[tokio::test]
    async fn registry_resolves_counter_by_model_name() {
        let mut registry = TokenizerRegistry::new();
        registry.register("scripted-model", Arc::new(CharCounter));

        let mut config = delete_config(10_000);
        config.model = "scripted-model".into();
        let b = ContextBuilder::with_registry(config, &registry, None).unwrap();

        // CharCounter charges per character; the heuristic fallback would
        // report 2 tokens for a 6-char prompt, not 6.
        let built = b.build("prompt", &[], vec![]).await.unwrap();
        assert_eq!(built.report.allocation.unwrap().system_prompt_tokens, 6);
    }

    #[tokio::test]
    async fn unknown_model_falls_back_to_heuristic_counter() {
        let registry = TokenizerRegistry::new();
        let mut config = delete_config(10_000);
        config.model = "unregistered-model".into();
        let b = ContextBuilder::with_registry(config, &registry, None).unwrap();

        let built = b.build("prompt", &[], vec![]).await.unwrap();
        assert_eq!(built.report.allocation.unwrap().system_prompt_tokens, 2);
    }

    #[test]
    fn extract_strategy_without_oracle_rejected() {
        let config = ContextConfig {
            strategy: PruneStrategy::Extract,
            ..ContextConfig::default()
        };
        let err = ContextBuilder::new(config, Arc::new(CharCounter), None).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Multi-byte content; the cut must not split a code point.
        let prompt = "héllo wörld ".repeat(50);
        let truncated = truncate_to_budget(&prompt, prompt.len(), 10);
        assert!(truncated.ends_with(TRUNCATION_WARNING));
    }

    #[test]
    fn empty_token_count_uses_default_ratio() {
        let truncated = truncate_to_budget("abc", 0, 100);
        assert!(truncated.starts_with("abc"));
    }
}
