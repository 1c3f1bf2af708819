//! Tokenizer registry — explicit model-to-tokenizer mapping.
//!
//! The registry is built once at startup by constructor injection and then
//! only queried; there is no teardown. Lookups for unregistered models fall
//! back to the character heuristic so that counting never fails.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use promptfit_config::ContextConfig;
use promptfit_core::counter::TokenCounter;
use promptfit_core::error::{Error, Result};
use tokenizers::Tokenizer;
use tracing::warn;

use crate::counter::HeuristicCounter;

/// A [`TokenCounter`] backed by a HuggingFace `tokenizer.json` file.
pub struct HfCounter {
    tokenizer: Tokenizer,
}

impl HfCounter {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| Error::Config {
            message: format!("Failed to load tokenizer from {}: {e}", path.display()),
        })?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                warn!(error = %e, "Tokenizer encode failed, falling back to heuristic");
                HeuristicCounter.count(text)
            }
        }
    }
}

/// Maps model names to token counters.
///
/// Built explicitly and passed by reference into the components that need
/// it — no global singleton caches.
#[derive(Default)]
pub struct TokenizerRegistry {
    counters: HashMap<String, Arc<dyn TokenCounter>>,
}

impl TokenizerRegistry {
    /// Create an empty registry. Every lookup falls back to the heuristic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the `tokenizers` map in the config, loading
    /// each `tokenizer.json` eagerly so bad paths fail at startup.
    pub fn from_config(config: &ContextConfig) -> Result<Self> {
        let mut registry = Self::new();
        for (model, path) in &config.tokenizers {
            registry.register_file(model.clone(), path)?;
        }
        Ok(registry)
    }

    /// Register a tokenizer file for a model name.
    pub fn register_file(&mut self, model: impl Into<String>, path: &Path) -> Result<()> {
        let counter = HfCounter::from_file(path)?;
        self.counters.insert(model.into(), Arc::new(counter));
        Ok(())
    }

    /// Register an arbitrary counter for a model name (used by tests and
    /// embedders with their own tokenization).
    pub fn register(&mut self, model: impl Into<String>, counter: Arc<dyn TokenCounter>) {
        self.counters.insert(model.into(), counter);
    }

    /// Get the counter for a model, falling back to the character heuristic
    /// when the model is unknown.
    pub fn counter(&self, model: &str) -> Arc<dyn TokenCounter> {
        match self.counters.get(model) {
            Some(counter) => Arc::clone(counter),
            None => {
                warn!(
                    model = %model,
                    "No tokenizer registered, token counts will be estimated"
                );
                Arc::new(HeuristicCounter)
            }
        }
    }

    /// Whether a real tokenizer is registered for this model.
    pub fn has(&self, model: &str) -> bool {
        self.counters.contains_key(model)
    }
}
