//! Configuration loading, validation, and management for promptfit.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Which task profile the budget split should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Balanced split between history and documents.
    #[default]
    Default,
    /// Coding tasks — documents weigh more.
    Coding,
    /// Chat tasks — history weighs more.
    Chat,
}

/// Which document pruning strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PruneStrategy {
    /// Drop whole documents from the tail of the importance order.
    Delete,
    /// Extract relevant sub-ranges from oversized documents via the oracle.
    #[default]
    Extract,
}

/// Which oracle variant the extract strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Oracle returns line ranges over numbered content.
    #[default]
    Ranges,
    /// Oracle returns scored text snippets.
    Scoring,
}

/// The root configuration for the context engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Model name used for token counting and oracle prompts.
    #[serde(default = "default_model")]
    pub model: String,

    /// Total context window size of the target model, in tokens.
    #[serde(default = "default_max_window_size")]
    pub max_window_size: usize,

    /// Fraction of the window treated as usable (headroom for output).
    #[serde(default = "default_safe_zone_fraction")]
    pub safe_zone_fraction: f64,

    /// Task profile selecting the history/document weight split.
    #[serde(default)]
    pub task_type: TaskType,

    /// Document pruning strategy.
    #[serde(default)]
    pub strategy: PruneStrategy,

    /// Oracle variant for the extract strategy.
    #[serde(default)]
    pub extract_mode: ExtractMode,

    /// Width of the extraction worker pool.
    #[serde(default = "default_worker_pool")]
    pub worker_pool: usize,

    /// Fraction of the document budget under which documents are kept whole.
    #[serde(default = "default_small_file_threshold")]
    pub small_file_threshold: f64,

    /// Minimum snippet score kept by the scoring variant (0–10).
    #[serde(default = "default_score_threshold")]
    pub score_threshold: u8,

    /// Per-document oracle call deadline, in seconds.
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,

    /// Model name → tokenizer.json path, for exact token counting.
    #[serde(default)]
    pub tokenizers: HashMap<String, PathBuf>,
}

fn default_model() -> String {
    "deepseek-default".into()
}
fn default_max_window_size() -> usize {
    50_000
}
fn default_safe_zone_fraction() -> f64 {
    0.9
}
fn default_worker_pool() -> usize {
    8
}
fn default_small_file_threshold() -> f64 {
    0.8
}
fn default_score_threshold() -> u8 {
    5
}
fn default_oracle_timeout_secs() -> u64 {
    30
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_window_size: default_max_window_size(),
            safe_zone_fraction: default_safe_zone_fraction(),
            task_type: TaskType::default(),
            strategy: PruneStrategy::default(),
            extract_mode: ExtractMode::default(),
            worker_pool: default_worker_pool(),
            small_file_threshold: default_small_file_threshold(),
            score_threshold: default_score_threshold(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            tokenizers: HashMap::new(),
        }
    }
}

impl ContextConfig {
    /// Load from a file, then apply environment variable overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        // Environment variable overrides (highest priority)
        if let Ok(model) = std::env::var("PROMPTFIT_MODEL") {
            config.model = model;
        }
        if let Ok(window) = std::env::var("PROMPTFIT_MAX_WINDOW_SIZE") {
            config.max_window_size = window.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "PROMPTFIT_MAX_WINDOW_SIZE must be an integer, got '{window}'"
                ))
            })?;
        }
        if let Ok(workers) = std::env::var("PROMPTFIT_WORKER_POOL") {
            config.worker_pool = workers.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "PROMPTFIT_WORKER_POOL must be an integer, got '{workers}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file path. Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_window_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_window_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.safe_zone_fraction) || self.safe_zone_fraction == 0.0 {
            return Err(ConfigError::ValidationError(
                "safe_zone_fraction must be in (0.0, 1.0]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.small_file_threshold) || self.small_file_threshold == 0.0 {
            return Err(ConfigError::ValidationError(
                "small_file_threshold must be in (0.0, 1.0]".into(),
            ));
        }
        if self.worker_pool == 0 {
            return Err(ConfigError::ValidationError(
                "worker_pool must be >= 1".into(),
            ));
        }
        if self.score_threshold > 10 {
            return Err(ConfigError::ValidationError(
                "score_threshold must be <= 10".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
