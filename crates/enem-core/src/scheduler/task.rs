use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

/// Final per-year result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearOutcome {
    Success,
    FailedAfterAllAttempts,
    Cancelled,
}

impl std::fmt::Display for YearOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            YearOutcome::Success => "success",
            YearOutcome::FailedAfterAllAttempts => "failed after all attempts",
            YearOutcome::Cancelled => "cancelled",
        })
    }
}

/// Retry state of one requested year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTask {
    pub year: u16,
    pub status: TaskStatus,
    pub attempts: u32,
    /// Rendered error of the latest failed attempt.
    #[serde(default)]
    pub last_error: Option<String>,
}

impl YearTask {
    pub fn new(year: u16) -> Self {
        Self {
            year,
            status: TaskStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Outcome once the batch is over; a task left pending counts as failed.
    pub fn outcome(&self) -> YearOutcome {
        match self.status {
            TaskStatus::Succeeded => YearOutcome::Success,
            TaskStatus::Cancelled => YearOutcome::Cancelled,
            TaskStatus::Pending | TaskStatus::Failed => YearOutcome::FailedAfterAllAttempts,
        }
    }
}
