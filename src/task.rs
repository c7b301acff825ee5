//! Task data model and status state machine
//!
//! Tasks are durable rows in the store. They are created by the seeder,
//! mutated only by the scheduler (status transitions), and never deleted.
//! `depends_on` references at most one other task, forming linear chains.

use crate::error::{CapweightError, Result};
use crate::types::{RunDate, TaskId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Ensure the ticker universe is present in the store
    TickerRefresh,
    /// Pull daily close prices and market caps from the external feed
    PriceFetch,
    /// Select constituents and compute the performance value for one date
    IndexBuild,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::TickerRefresh => "TICKER_REFRESH",
            TaskType::PriceFetch => "PRICE_FETCH",
            TaskType::IndexBuild => "INDEX_BUILD",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "TICKER_REFRESH" => Ok(TaskType::TickerRefresh),
            "PRICE_FETCH" => Ok(TaskType::PriceFetch),
            "INDEX_BUILD" => Ok(TaskType::IndexBuild),
            other => Err(CapweightError::ParseError(format!(
                "Unknown task type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Initiated,
    InProgress,
    Failed,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Initiated => "INITIATED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "INITIATED" => Ok(TaskStatus::Initiated),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "FAILED" => Ok(TaskStatus::Failed),
            "COMPLETED" => Ok(TaskStatus::Completed),
            other => Err(CapweightError::ParseError(format!(
                "Unknown task status: {}",
                other
            ))),
        }
    }

    /// Whether a drain should pick the task up
    pub fn is_runnable(&self) -> bool {
        matches!(self, TaskStatus::Initiated | TaskStatus::Failed)
    }

    /// Whether the status is a legal successor of `self`.
    ///
    /// The scheduler only ever moves runnable tasks to InProgress and
    /// InProgress tasks to a terminal outcome. Failed is not terminal:
    /// failed tasks re-qualify on the next drain.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Initiated | TaskStatus::Failed => next == TaskStatus::InProgress,
            TaskStatus::InProgress => {
                matches!(next, TaskStatus::Completed | TaskStatus::Failed)
            }
            TaskStatus::Completed => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub status: TaskStatus,
    /// The date this task logically applies to
    pub run_date: RunDate,
    /// Optional parent task; chains are linear, never a general graph
    pub depends_on: Option<TaskId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn has_dependency(&self) -> bool {
        self.depends_on.is_some()
    }
}
