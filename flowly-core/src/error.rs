use thiserror::Error;

use crate::store::DayKey;

/// Failures surfaced by the planning service.
///
/// Task-level problems (missing durations, past deadlines, tasks that do not
/// fit) are never errors; they show up as notes and deferrals on the plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid plan config: {0}")]
    Validation(String),

    #[error("no plan generated for {0}")]
    NotFound(DayKey),

    #[error("task source unavailable: {0}")]
    TaskSource(String),

    #[error("plan store unavailable: {0}")]
    Store(String),

    #[error("plan invariant violated: {0}")]
    Invariant(String),
}

impl PlanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
