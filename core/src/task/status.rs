use std::fmt;

use serde::{Deserialize, Serialize};

/// Task lifecycle state.
///
/// ```text
/// Open -> InProgress -> Done -> Accepted
///   |                    ^
///   +--------------------+
/// ```
///
/// Stored in the legacy string encoding (`OPEN`, `IN_ARBEIT`, `ERLEDIGT`,
/// `ABGENOMMEN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
    Accepted,
}

impl TaskStatus {
    /// Every status, for iteration.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Accepted,
    ];

    /// Parse the stored string. Anything unrecognized reads as Open.
    pub fn from_storage(value: &str) -> TaskStatus {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => TaskStatus::Open,
            "IN_ARBEIT" => TaskStatus::InProgress,
            "ERLEDIGT" => TaskStatus::Done,
            "ABGENOMMEN" => TaskStatus::Accepted,
            _ => TaskStatus::Open,
        }
    }

    /// Legacy string written to `STATUS`.
    pub fn storage_value(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::InProgress => "IN_ARBEIT",
            TaskStatus::Done => "ERLEDIGT",
            TaskStatus::Accepted => "ABGENOMMEN",
        }
    }

    /// Counts toward the brigade's active load.
    pub fn is_active_load(&self) -> bool {
        matches!(self, TaskStatus::Open | TaskStatus::InProgress)
    }

    /// True once sealed.
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Accepted)
    }

    /// True for the four allowed moves.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        matches!(
            (self, target),
            (TaskStatus::Open, TaskStatus::InProgress)
                | (TaskStatus::Open, TaskStatus::Done)
                | (TaskStatus::InProgress, TaskStatus::Done)
                | (TaskStatus::Done, TaskStatus::Accepted)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_value())
    }
}
