//! Error types for the promptfit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all promptfit operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Budget errors ---
    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    // --- Pruning errors ---
    #[error("Pruning error: {0}")]
    Prune(#[from] PruneError),

    // --- Oracle errors ---
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum BudgetError {
    #[error(
        "System prompt alone ({system_prompt_tokens} tokens) exceeds or equals \
         the total safe zone ({total_safe_zone} tokens)"
    )]
    SystemPromptTooLarge {
        system_prompt_tokens: usize,
        total_safe_zone: usize,
    },

    #[error("Invalid task profile: weights {history_weight} + {document_weight} do not sum to 1.0")]
    InvalidProfile {
        history_weight: f64,
        document_weight: f64,
    },
}

#[derive(Debug, Clone, Error)]
pub enum PruneError {
    #[error("Pruning budget must be positive, got {budget}")]
    InvalidBudget { budget: usize },
}

#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Oracle transport failed: {0}")]
    Transport(String),

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("Invalid line range: start {start_line} > end {end_line}")]
    InvalidRange { start_line: usize, end_line: usize },

    #[error("Oracle call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Prompt rendering failed: {0}")]
    PromptRender(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_error_displays_correctly() {
        let err = Error::Budget(BudgetError::SystemPromptTooLarge {
            system_prompt_tokens: 1200,
            total_safe_zone: 900,
        });
        assert!(err.to_string().contains("1200"));
        assert!(err.to_string().contains("900"));
    }

    #[test]
    fn oracle_error_displays_correctly() {
        let err = Error::Oracle(OracleError::InvalidRange {
            start_line: 42,
            end_line: 7,
        });
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn prune_error_carries_budget() {
        let err = Error::Prune(PruneError::InvalidBudget { budget: 0 });
        assert!(err.to_string().contains("positive"));
    }
}
