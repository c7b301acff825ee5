//! Dependency-ordered task scheduler
//!
//! One `run_once` call is a drain: it loads every runnable task (Initiated
//! or Failed), orders the batch so dependencies come first, and executes
//! each task at most once. Executor failures are absorbed into the task's
//! Failed status and never propagate to the caller; the task re-qualifies
//! on the next drain.
//!
//! Execution is single-writer and strictly sequential. There is no internal
//! re-entrancy lock: the host must guarantee non-overlapping `run_once`
//! invocations, since overlapping drains would race on status updates.

use crate::dispatcher::{dispatch, TaskContext, TaskPayload};
use crate::error::Result;
use crate::feed::{PriceFeed, TickerUniverse};
use crate::store::Store;
use crate::task::{Task, TaskStatus};
use crate::types::TaskId;
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

/// What one drain did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub completed: usize,
    pub failed: usize,
    /// Tasks whose dependency was not satisfied; left for the next drain
    pub deferred: usize,
}

/// Single-worker scheduler over the task store
pub struct Scheduler<'a> {
    ctx: TaskContext,
    feed: &'a dyn PriceFeed,
    universe: &'a dyn TickerUniverse,
}

impl<'a> Scheduler<'a> {
    pub fn new(ctx: TaskContext, feed: &'a dyn PriceFeed, universe: &'a dyn TickerUniverse) -> Self {
        Self {
            ctx,
            feed,
            universe,
        }
    }

    /// Execute one full drain of the runnable tasks.
    ///
    /// Each task is attempted at most once per drain. A task whose
    /// dependency completes earlier in the same drain runs within that
    /// drain; one whose dependency is missing, failed or not yet seeded
    /// is deferred to the next invocation.
    pub fn run_once(&self, store: &mut Store) -> Result<DrainReport> {
        let batch = store.runnable_tasks()?;
        let ordered = order_by_dependency(batch);

        let mut report = DrainReport::default();
        let mut completed_now: HashSet<TaskId> = HashSet::new();

        for task in &ordered {
            if let Some(dep_id) = task.depends_on {
                if !self.dependency_satisfied(store, dep_id, &completed_now)? {
                    log::debug!(
                        "Task {} deferred; dependency {} not completed",
                        task.id,
                        dep_id
                    );
                    report.deferred += 1;
                    continue;
                }
            }

            match self.execute(store, task) {
                Ok(()) => {
                    completed_now.insert(task.id);
                    report.completed += 1;
                    log::debug!("Task {} ({}) completed", task.id, task.task_type);
                }
                Err(e) => {
                    // Absorbed: the drain continues and the task retries
                    // on the next invocation.
                    log::warn!("Task {} ({}) failed: {}", task.id, task.task_type, e);
                    store.set_task_status(task.id, TaskStatus::Failed)?;
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Drain finished: {} completed, {} failed, {} deferred",
            report.completed,
            report.failed,
            report.deferred
        );
        Ok(report)
    }

    /// Run one task inside a single transaction.
    ///
    /// Status moves Initiated/Failed → InProgress → Completed within the
    /// transaction; on error the whole transaction rolls back and the
    /// caller records Failed in a separate committed write.
    fn execute(&self, store: &mut Store, task: &Task) -> Result<()> {
        let payload = TaskPayload::for_task(task, &self.ctx);

        store.begin()?;
        let result: Result<()> = (|| {
            store.set_task_status(task.id, TaskStatus::InProgress)?;
            dispatch(store, self.feed, self.universe, &payload)?;
            store.set_task_status(task.id, TaskStatus::Completed)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                store.commit()?;
                Ok(())
            }
            Err(e) => {
                store.rollback()?;
                Err(e)
            }
        }
    }

    fn dependency_satisfied(
        &self,
        store: &Store,
        dep_id: TaskId,
        completed_now: &HashSet<TaskId>,
    ) -> Result<bool> {
        if completed_now.contains(&dep_id) {
            return Ok(true);
        }
        match store.task(dep_id)? {
            Some(dep) => Ok(dep.status == TaskStatus::Completed),
            None => {
                log::warn!("Dependency {} does not exist", dep_id);
                Ok(false)
            }
        }
    }
}

/// Order a batch so in-batch dependencies come before their dependents.
///
/// Kahn-style pass: tasks whose dependency is outside the batch count as
/// roots. FIFO (id) order is preserved among tasks at the same depth.
/// Tasks caught in an in-batch cycle are dropped from the order; the
/// per-task dependency check would defer them anyway, and seed-time
/// validation rejects cycles before they reach the store.
fn order_by_dependency(batch: Vec<Task>) -> Vec<Task> {
    let in_batch: HashSet<TaskId> = batch.iter().map(|t| t.id).collect();
    let mut dependents: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    let mut blocked_by: HashMap<TaskId, TaskId> = HashMap::new();

    for task in &batch {
        if let Some(dep_id) = task.depends_on {
            if in_batch.contains(&dep_id) {
                dependents.entry(dep_id).or_default().push(task.id);
                blocked_by.insert(task.id, dep_id);
            }
        }
    }

    let mut by_id: HashMap<TaskId, Task> = batch.into_iter().map(|t| (t.id, t)).collect();
    let mut queue: VecDeque<TaskId> = VecDeque::new();
    let mut roots: Vec<TaskId> = by_id
        .keys()
        .filter(|id| !blocked_by.contains_key(*id))
        .copied()
        .collect();
    roots.sort_unstable();
    queue.extend(roots);

    let mut ordered = Vec::with_capacity(by_id.len());
    while let Some(id) = queue.pop_front() {
        if let Some(task) = by_id.remove(&id) {
            ordered.push(task);
        }
        if let Some(children) = dependents.get(&id) {
            for child in children {
                if by_id.contains_key(child) {
                    queue.push_back(*child);
                }
            }
        }
    }

    ordered
}
