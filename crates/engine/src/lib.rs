//! The promptfit engine: fits a system prompt, a conversation, and a pool of
//! documents into a model's context window.
//!
//! The pipeline is budget → prune → assemble:
//!
//! - [`budget`] splits the safe zone between history and documents by task
//!   type.
//! - [`pruner`] cuts each side down to its budget. History keeps the newest
//!   suffix; documents go through the delete or extract strategy, the latter
//!   backed by a [`RelevanceOracle`](promptfit_core::oracle::RelevanceOracle).
//! - [`assembler`] runs both paths concurrently and emits the final message
//!   list with an [`AssemblyReport`] recording every cut.
//!
//! Degradation over failure throughout: a single oracle failure costs one
//! document, an oversized system prompt yields a truncated context, and the
//! caller always gets a usable message list.

pub mod assembler;
pub mod budget;
pub mod oracle;
pub mod prompt;
pub mod pruner;
pub mod ranges;

pub use assembler::{AssemblyReport, BuiltContext, ContextBuilder, TRUNCATION_WARNING};
pub use budget::{BudgetAllocation, TaskProfile};
pub use oracle::{CompletionClient, LlmOracle, MAX_ORACLE_ITEMS};
pub use pruner::{
    DeletePruner, DocumentPruner, DropReason, DropRecord, ExtractOptions, ExtractPruner,
    HistoryOutcome, PruneOutput, prune_history,
};
pub use ranges::merge_ranges;
