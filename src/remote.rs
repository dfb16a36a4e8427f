/*
Contract with the remote service holding the durable state,
plus the handlers that combine a remote call with a store update.

A handler awaits the remote first and only touches the store once the
result is in; a failed call leaves the store exactly as it was.
*/

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::dates;
use crate::duration::Duration;
use crate::error::{Error, Result};
use crate::logic::Direction;
use crate::models::{
    self, DayPayload, ExecutionId, IntoTaskExecution, TaskExecution, TaskExecutionRecord, TaskId,
    TaskRecord,
};
use crate::store::PlannerStore;

// Partial update of an execution, as sent to the remote.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExecutionChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<String>, // "YYYY-MM-DD"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TaskChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

/// Remote source of truth for tasks and executions.
///
/// Implementations translate these calls into whatever transport the
/// service speaks and report failures as [`Error::Remote`].
pub trait ScheduleService: Send + Sync {
    fn fetch_day(&self, day: NaiveDate) -> impl Future<Output = Result<DayPayload>> + Send;

    fn fetch_incomplete_tasks(&self) -> impl Future<Output = Result<Vec<TaskRecord>>> + Send;

    fn fetch_missed(&self) -> impl Future<Output = Result<Vec<TaskExecutionRecord>>> + Send;

    fn update_execution(
        &self,
        id: ExecutionId,
        change: ExecutionChange,
    ) -> impl Future<Output = Result<TaskExecutionRecord>> + Send;

    /// Swaps day orders with the neighbour in `direction`; returns every execution that changed.
    fn exchange_execution(
        &self,
        id: ExecutionId,
        direction: Direction,
    ) -> impl Future<Output = Result<Vec<TaskExecutionRecord>>> + Send;

    /// Deletes the execution and returns its task as updated by the deletion.
    fn delete_execution(&self, id: ExecutionId) -> impl Future<Output = Result<TaskRecord>> + Send;

    fn update_task(
        &self,
        id: TaskId,
        change: TaskChange,
    ) -> impl Future<Output = Result<TaskRecord>> + Send;
}

pub struct Planner<S> {
    store: Arc<RwLock<PlannerStore>>,
    service: S,
}

impl<S: ScheduleService> Planner<S> {
    pub fn new(store: Arc<RwLock<PlannerStore>>, service: S) -> Self {
        Planner { store, service }
    }

    pub fn store(&self) -> Arc<RwLock<PlannerStore>> {
        Arc::clone(&self.store)
    }

    pub async fn load_day(&self, day: NaiveDate, now: DateTime<FixedOffset>) -> Result<()> {
        let payload = self.service.fetch_day(day).await?;
        let rejected = self.store.write().await.apply_day_payload(payload, now)?;
        debug!(day = %day, rejected, "day loaded");
        Ok(())
    }

    // Loads `count` consecutive days starting at `from`.
    pub async fn load_days(&self, from: NaiveDate, count: u32, now: DateTime<FixedOffset>) -> Result<()> {
        for offset in 0..i64::from(count) {
            self.load_day(dates::day_delta(from, offset), now).await?;
        }
        Ok(())
    }

    pub async fn load_incomplete_tasks(&self) -> Result<()> {
        let tasks = self.service.fetch_incomplete_tasks().await?;
        self.store.write().await.set_incomplete(tasks);
        Ok(())
    }

    pub async fn load_missed(&self) -> Result<()> {
        let missed = self.service.fetch_missed().await?;
        self.store.write().await.set_missed(missed);
        Ok(())
    }

    pub async fn finish_execution(
        &self,
        id: ExecutionId,
        finished: bool,
        now: DateTime<FixedOffset>,
    ) -> Result<TaskExecution> {
        let change = ExecutionChange {
            finished: Some(finished),
            ..ExecutionChange::default()
        };
        self.change_execution(id, change, now).await
    }

    pub async fn change_execution_duration(
        &self,
        id: ExecutionId,
        duration: Duration,
        now: DateTime<FixedOffset>,
    ) -> Result<TaskExecution> {
        let change = ExecutionChange {
            duration: Some(duration),
            ..ExecutionChange::default()
        };
        self.change_execution(id, change, now).await
    }

    // Moves the execution `days` days forward (negative moves it back).
    pub async fn postpone_execution(
        &self,
        id: ExecutionId,
        days: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<TaskExecution> {
        let current = self.known_execution(id).await?;
        let change = ExecutionChange {
            day: Some(dates::format_day(dates::day_delta(current.day, days))),
            ..ExecutionChange::default()
        };
        self.change_execution(id, change, now).await
    }

    // Returns the updated executions, or None when there is nothing to swap with.
    pub async fn exchange_execution(
        &self,
        id: ExecutionId,
        direction: Direction,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<Vec<TaskExecution>>> {
        let current = self.known_execution(id).await?;
        if self
            .store
            .read()
            .await
            .find_exchange_candidate(&current, direction)
            .is_none()
        {
            debug!(execution_id = id, ?direction, "no exchange candidate");
            return Ok(None);
        }

        let records = self.service.exchange_execution(id, direction).await?;
        // Normalize everything before the store is touched.
        let updated = records
            .into_iter()
            .map(IntoTaskExecution::into_task_execution)
            .collect::<Result<Vec<TaskExecution>>>()?;

        let mut store = self.store.write().await;
        for execution in &updated {
            store.upsert_execution(execution.clone(), now)?;
        }
        Ok(Some(updated))
    }

    pub async fn delete_execution(&self, id: ExecutionId) -> Result<()> {
        let task = models::to_task(self.service.delete_execution(id).await?)?;
        let mut store = self.store.write().await;
        store.remove_execution(id);
        store.propagate_task_update(task)?;
        info!(execution_id = id, "task execution deleted");
        Ok(())
    }

    pub async fn update_task(&self, id: TaskId, change: TaskChange) -> Result<()> {
        let task = self.service.update_task(id, change).await?;
        self.store.write().await.propagate_task_update(task)?;
        Ok(())
    }

    async fn known_execution(&self, id: ExecutionId) -> Result<TaskExecution> {
        self.store
            .read()
            .await
            .find_execution(id)
            .cloned()
            .ok_or(Error::ExecutionNotFound(id))
    }

    // The execution's task aggregates change with it, so the task fans out too.
    async fn change_execution(
        &self,
        id: ExecutionId,
        change: ExecutionChange,
        now: DateTime<FixedOffset>,
    ) -> Result<TaskExecution> {
        let record = self.service.update_execution(id, change).await?;
        let mut store = self.store.write().await;
        let execution = store.upsert_execution(record, now)?;
        store.propagate_task_update(execution.task.clone())?;
        Ok(execution)
    }
}
