//! Task persistence

use super::Store;
use crate::error::Result;
use crate::task::{Task, TaskStatus, TaskType};
use crate::types::{RunDate, TaskId};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

const TASK_COLUMNS: &str = "id, task_type, status, run_date, depends_on, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let task_type: String = row.get(1)?;
    let status: String = row.get(2)?;
    Ok(Task {
        id: row.get(0)?,
        task_type: TaskType::parse(&task_type).map_err(|_| {
            rusqlite::Error::InvalidColumnType(1, "task_type".into(), rusqlite::types::Type::Text)
        })?,
        status: TaskStatus::parse(&status).map_err(|_| {
            rusqlite::Error::InvalidColumnType(2, "status".into(), rusqlite::types::Type::Text)
        })?,
        run_date: row.get(3)?,
        depends_on: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Store {
    /// Insert a new task in status Initiated
    pub fn insert_task(
        &mut self,
        task_type: TaskType,
        run_date: RunDate,
        depends_on: Option<TaskId>,
    ) -> Result<Task> {
        let now = Utc::now();
        self.conn().execute(
            "INSERT INTO tasks (task_type, status, run_date, depends_on, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task_type.as_str(),
                TaskStatus::Initiated.as_str(),
                run_date,
                depends_on,
                now,
                now,
            ],
        )?;
        let id = self.conn().last_insert_rowid();

        Ok(Task {
            id,
            task_type,
            status: TaskStatus::Initiated,
            run_date,
            depends_on,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get task by id
    pub fn task(&self, id: TaskId) -> Result<Option<Task>> {
        let result = self
            .conn()
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// All tasks a drain should pick up (Initiated or Failed), in id order
    pub fn runnable_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM tasks WHERE status IN (?1, ?2) ORDER BY id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(
                params![TaskStatus::Initiated.as_str(), TaskStatus::Failed.as_str()],
                task_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// List tasks, optionally filtered by status
    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let tasks = match status {
            Some(status) => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {} FROM tasks WHERE status = ?1 ORDER BY id",
                    TASK_COLUMNS
                ))?;
                let rows = stmt.query_map(params![status.as_str()], task_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self
                    .conn()
                    .prepare(&format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS))?;
                let rows = stmt.query_map([], task_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(tasks)
    }

    /// Tasks seeded for a run date
    pub fn tasks_for_date(&self, run_date: RunDate) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM tasks WHERE run_date = ?1 ORDER BY id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(params![run_date], task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Update a task's status, bumping updated_at
    pub fn set_task_status(&mut self, id: TaskId, status: TaskStatus) -> Result<()> {
        self.conn().execute(
            "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), Utc::now()],
        )?;
        Ok(())
    }
}
