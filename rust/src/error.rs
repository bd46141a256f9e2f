//! Error types surfaced by the ranking engine.

use thiserror::Error;

/// Errors that can stop a ranking run.
///
/// Every variant is fatal to the run: the engine never recovers internally
/// and never returns partial scores alongside an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    /// The dependency graph has at least one cycle. Carries every cycle found.
    #[error("Circular dependencies detected: {}", format_cycles(.cycles))]
    CircularDependencies { cycles: Vec<Vec<String>> },

    /// A task's numeric fields are outside their domain.
    #[error("Invalid attribute `{field}` on task {task_id}: {reason}")]
    InvalidTaskAttribute {
        task_id: String,
        field: &'static str,
        reason: String,
    },

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("Unknown ranking strategy: {0}")]
    UnknownStrategy(String),
}

impl RankingError {
    /// Stable machine-readable token for the rejection payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CircularDependencies { .. } => "circular_dependencies",
            Self::InvalidTaskAttribute { .. } => "invalid_task_attribute",
            Self::DuplicateTaskId(_) => "duplicate_task_id",
            Self::UnknownStrategy(_) => "unknown_strategy",
        }
    }

    /// All cycles carried by a `CircularDependencies` rejection.
    pub fn cycles(&self) -> Option<&[Vec<String>]> {
        match self {
            Self::CircularDependencies { cycles } => Some(cycles),
            _ => None,
        }
    }
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| format!("[{}]", cycle.join(" -> ")))
        .collect::<Vec<_>>()
        .join(", ")
}
