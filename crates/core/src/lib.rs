//! # promptfit Core
//!
//! Domain types, traits, and error definitions for the promptfit context
//! budgeting and pruning engine. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here (token counting,
//! relevance judging). Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod counter;
pub mod document;
pub mod error;
pub mod message;
pub mod oracle;

// Re-export key types at crate root for ergonomics
pub use counter::TokenCounter;
pub use document::Document;
pub use error::{BudgetError, Error, OracleError, PruneError, Result};
pub use message::{Conversation, ConversationId, Message, Role};
pub use oracle::{LineRange, RelevanceOracle, ScoredSnippet};
