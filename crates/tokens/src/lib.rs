//! Token counting for promptfit.
//!
//! Two implementations of the [`TokenCounter`] seam defined in core:
//!
//! - [`HeuristicCounter`] — character-based estimate (~4 chars per token),
//!   always available.
//! - [`HfCounter`] — exact counts from a HuggingFace `tokenizer.json` file,
//!   looked up through the explicitly-injected [`TokenizerRegistry`].
//!
//! [`TokenCounter`]: promptfit_core::counter::TokenCounter

pub mod counter;
pub mod registry;

pub use counter::{HeuristicCounter, MESSAGE_OVERHEAD_TOKENS, count_message};
pub use registry::{HfCounter, TokenizerRegistry};
