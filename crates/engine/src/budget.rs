//! Token budget computation — pure arithmetic, no I/O.
//!
//! Given a total safe-zone size, the cost of the fixed system prompt, and a
//! task-type weighting profile, computes the history and document budgets.
//! The two sub-budgets always sum exactly to the remaining capacity.

use promptfit_config::TaskType;
use promptfit_core::error::BudgetError;
use serde::{Deserialize, Serialize};

/// Relative weighting of history vs. documents for a task type.
///
/// `history_weight + document_weight == 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskProfile {
    pub history_weight: f64,
    pub document_weight: f64,
}

impl TaskProfile {
    /// The canonical profile for a task type.
    pub fn for_task(task: TaskType) -> Self {
        match task {
            TaskType::Default => Self {
                history_weight: 0.40,
                document_weight: 0.60,
            },
            // Coding leans on file context.
            TaskType::Coding => Self {
                history_weight: 0.25,
                document_weight: 0.75,
            },
            // Chat leans on the dialogue itself.
            TaskType::Chat => Self {
                history_weight: 0.70,
                document_weight: 0.30,
            },
        }
    }
}

/// The computed split of the safe zone for one assembly call.
///
/// Invariant: `history_budget + document_budget ==
/// total_safe_zone - system_prompt_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    /// Tokens reserved for the fixed system prompt.
    pub system_prompt_tokens: usize,
    /// Token ceiling for the conversation history.
    pub history_budget: usize,
    /// Token ceiling for the document pool.
    pub document_budget: usize,
}

impl BudgetAllocation {
    /// Split the safe zone between history and documents.
    ///
    /// Fails when the system prompt alone fills (or exceeds) the safe zone —
    /// that is fatal for the normal path and must be surfaced, not silently
    /// truncated here.
    pub fn compute(
        total_safe_zone: usize,
        system_prompt_tokens: usize,
        profile: TaskProfile,
    ) -> Result<Self, BudgetError> {
        if system_prompt_tokens >= total_safe_zone {
            return Err(BudgetError::SystemPromptTooLarge {
                system_prompt_tokens,
                total_safe_zone,
            });
        }

        let sum = profile.history_weight + profile.document_weight;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(BudgetError::InvalidProfile {
                history_weight: profile.history_weight,
                document_weight: profile.document_weight,
            });
        }

        let remaining = total_safe_zone - system_prompt_tokens;
        let mut history_budget = (remaining as f64 * profile.history_weight) as usize;
        let mut document_budget = (remaining as f64 * profile.document_weight) as usize;

        // Floor rounding can leave a residual; give it to the heavier side
        // so the sum invariant holds exactly. Ties favor the document budget.
        let residual = remaining - history_budget - document_budget;
        if profile.history_weight > profile.document_weight {
            history_budget += residual;
        } else {
            document_budget += residual;
        }

        Ok(Self {
            system_prompt_tokens,
            history_budget,
            document_budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_profile_end_to_end_example() {
        // safe zone 1000, system prompt 100, chat = 0.7 / 0.3
        let alloc =
            BudgetAllocation::compute(1000, 100, TaskProfile::for_task(TaskType::Chat)).unwrap();
        assert_eq!(alloc.history_budget, 630);
        assert_eq!(alloc.document_budget, 270);
        assert_eq!(alloc.history_budget + alloc.document_budget, 900);
    }

    #[test]
    fn sum_invariant_holds_across_inputs() {
        let profiles = [
            TaskProfile::for_task(TaskType::Default),
            TaskProfile::for_task(TaskType::Coding),
            TaskProfile::for_task(TaskType::Chat),
        ];
        for profile in profiles {
            for safe_zone in [10usize, 77, 1000, 45_000, 131_071] {
                for system in [0usize, 1, 9, safe_zone / 2, safe_zone - 1] {
                    let alloc = BudgetAllocation::compute(safe_zone, system, profile).unwrap();
                    assert_eq!(
                        alloc.history_budget + alloc.document_budget,
                        safe_zone - system,
                        "invariant violated for safe_zone={safe_zone} system={system}"
                    );
                }
            }
        }
    }

    #[test]
    fn residual_goes_to_larger_weight() {
        // remaining = 10, coding 0.25/0.75 → floor(2.5)=2, floor(7.5)=7,
        // residual 1 → documents
        let alloc =
            BudgetAllocation::compute(10, 0, TaskProfile::for_task(TaskType::Coding)).unwrap();
        assert_eq!(alloc.history_budget, 2);
        assert_eq!(alloc.document_budget, 8);

        // chat 0.70/0.30, remaining = 9 → floor(6.3)=6, floor(2.7)=2,
        // residual 1 → history (larger weight)
        let alloc =
            BudgetAllocation::compute(9, 0, TaskProfile::for_task(TaskType::Chat)).unwrap();
        assert_eq!(alloc.history_budget, 7);
        assert_eq!(alloc.document_budget, 2);
    }

    #[test]
    fn tie_favors_document_budget() {
        let even = TaskProfile {
            history_weight: 0.5,
            document_weight: 0.5,
        };
        // remaining = 9 → floor(4.5)=4 each, residual 1 → documents
        let alloc = BudgetAllocation::compute(9, 0, even).unwrap();
        assert_eq!(alloc.history_budget, 4);
        assert_eq!(alloc.document_budget, 5);
    }

    #[test]
    fn oversized_system_prompt_is_fatal() {
        let profile = TaskProfile::for_task(TaskType::Default);
        let err = BudgetAllocation::compute(900, 1200, profile).unwrap_err();
        assert!(matches!(err, BudgetError::SystemPromptTooLarge { .. }));

        // Equality is also rejected — nothing would remain.
        assert!(BudgetAllocation::compute(900, 900, profile).is_err());
    }

    #[test]
    fn bad_profile_rejected() {
        let profile = TaskProfile {
            history_weight: 0.4,
            document_weight: 0.4,
        };
        let err = BudgetAllocation::compute(1000, 100, profile).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidProfile { .. }));
    }
}
