/*
In-memory scheduling state.

PlannerStore owns the incomplete task index and the schedule (day buckets + missed).
Every mutation goes through one of the methods below; nothing outside writes fields.
*/

use std::collections::BTreeMap;
use std::{fs, path::Path};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dates;
use crate::duration::Duration;
use crate::error::Result;
use crate::logic::{self, Direction};
use crate::models::{
    build_day, Day, DayPayload, ExecutionId, IntoTask, IntoTaskExecution, Task, TaskExecution,
    TaskExecutionRecord, TaskId, TaskRecord,
};

// ------------------------------------------------------------
// Incomplete tasks
// ------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    incomplete: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incomplete(&self) -> &[Task] {
        &self.incomplete
    }

    // Replace everything. Tasks that are not incomplete are dropped; later ids win.
    pub fn set_incomplete(&mut self, tasks: Vec<Task>) {
        self.incomplete.clear();
        for task in tasks {
            self.upsert(task);
        }
    }

    pub fn upsert(&mut self, task: Task) {
        self.remove(task.id);
        if !task.incomplete() {
            return;
        }
        let index = logic::task_index(&self.incomplete, &task);
        self.incomplete.insert(index, task);
    }

    pub fn remove(&mut self, task_id: TaskId) {
        self.incomplete.retain(|t| t.id != task_id);
    }
}

// ------------------------------------------------------------
// Day buckets + missed backlog
// ------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ScheduleCollection {
    days: BTreeMap<NaiveDate, Day>,
    missed: Vec<TaskExecution>,
}

impl ScheduleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    // Rebuild a day bucket from scratch, inserting one execution at a time.
    // Copies of the incoming executions elsewhere (other days, missed) are replaced.
    pub fn set_day(
        &mut self,
        day: NaiveDate,
        max_duration: Duration,
        executions: Vec<TaskExecution>,
        now: DateTime<FixedOffset>,
    ) {
        let mut bucket = Vec::with_capacity(executions.len());
        for execution in executions {
            if execution.day != day {
                warn!(
                    execution_id = execution.id,
                    execution_day = %execution.day,
                    bucket_day = %day,
                    "execution listed under a different day"
                );
            }
            bucket.retain(|e: &TaskExecution| e.id != execution.id);
            logic::insert_execution(&mut bucket, execution);
        }
        for execution in &bucket {
            self.remove_execution(execution.id);
            if execution.missed(now) {
                self.missed.push(execution.clone());
            }
        }
        self.days.insert(day, build_day(day, max_duration, bucket));
    }

    pub fn upsert_execution(&mut self, execution: TaskExecution, now: DateTime<FixedOffset>) {
        self.remove_execution(execution.id);

        match self.days.get_mut(&execution.day) {
            Some(bucket) => logic::insert_execution(&mut bucket.executions, execution.clone()),
            None => warn!(
                execution_id = execution.id,
                day = %execution.day,
                "not adding task execution to a day that is not loaded"
            ),
        }

        if execution.missed(now) {
            self.missed.push(execution);
        }
    }

    // Returns whether anything was removed.
    pub fn remove_execution(&mut self, id: ExecutionId) -> bool {
        let mut removed = false;
        for bucket in self.days.values_mut() {
            let before = bucket.executions.len();
            bucket.executions.retain(|e| e.id != id);
            removed |= bucket.executions.len() != before;
        }
        let before = self.missed.len();
        self.missed.retain(|e| e.id != id);
        removed | (self.missed.len() != before)
    }

    pub fn set_missed(&mut self, executions: Vec<TaskExecution>) {
        self.missed = executions;
    }

    pub fn missed(&self) -> &[TaskExecution] {
        &self.missed
    }

    pub fn is_loaded(&self, day: NaiveDate) -> bool {
        self.days.contains_key(&day)
    }

    // Unknown days answer with an empty placeholder (max duration 0).
    pub fn query_day(&self, day: NaiveDate) -> Day {
        match self.days.get(&day) {
            Some(stored) => stored.clone(),
            None => {
                warn!(day = %day, "day not in store");
                build_day(day, Duration::ZERO, Vec::new())
            }
        }
    }

    pub fn loaded_days(&self) -> impl Iterator<Item = &Day> {
        self.days.values()
    }

    // Looks in day buckets first, then the missed backlog.
    pub fn find_execution(&self, id: ExecutionId) -> Option<&TaskExecution> {
        self.days
            .values()
            .flat_map(|d| d.executions.iter())
            .chain(self.missed.iter())
            .find(|e| e.id == id)
    }

    pub fn find_exchange_candidate(
        &self,
        execution: &TaskExecution,
        direction: Direction,
    ) -> Option<TaskExecution> {
        let bucket = self.days.get(&execution.day)?;
        logic::exchange_candidate(&bucket.executions, execution, direction).cloned()
    }

    // Overwrite the embedded task copy everywhere. Returns the number of copies touched.
    pub fn replace_task(&mut self, task: &Task) -> usize {
        let mut touched = 0;
        let executions = self
            .days
            .values_mut()
            .flat_map(|d| d.executions.iter_mut())
            .chain(self.missed.iter_mut());
        for execution in executions {
            if execution.task.id == task.id {
                execution.task = task.clone();
                touched += 1;
            }
        }
        touched
    }
}

// ------------------------------------------------------------
// Store facade
// ------------------------------------------------------------

/// Snapshot used to preload a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub days: Vec<DayPayload>,
    #[serde(default)]
    pub incomplete: Vec<TaskRecord>,
    #[serde(default)]
    pub missed: Vec<TaskExecutionRecord>,
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let text = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&text)?;
    Ok(snapshot)
}

#[derive(Debug, Clone, Default)]
pub struct PlannerStore {
    tasks: TaskCollection,
    schedule: ScheduleCollection,
}

// Normalize a batch, dropping (and logging) records that fail to parse.
fn normalize_all<T, I>(inputs: Vec<I>, convert: impl Fn(I) -> Result<T>) -> (Vec<T>, usize) {
    let mut rejected = 0;
    let items = inputs
        .into_iter()
        .filter_map(|input| match convert(input) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(error = %err, "rejected record");
                rejected += 1;
                None
            }
        })
        .collect();
    (items, rejected)
}

impl PlannerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot, now: DateTime<FixedOffset>) -> Result<Self> {
        let mut store = PlannerStore::new();
        for payload in snapshot.days {
            store.apply_day_payload(payload, now)?;
        }
        store.set_incomplete(snapshot.incomplete);
        store.set_missed(snapshot.missed);
        debug!(
            days = store.schedule.days.len(),
            incomplete = store.tasks.incomplete.len(),
            missed = store.schedule.missed.len(),
            at = %now,
            "store loaded from snapshot"
        );
        Ok(store)
    }

    // ----- queries -----

    pub fn query_day(&self, day: NaiveDate) -> Day {
        self.schedule.query_day(day)
    }

    pub fn is_day_loaded(&self, day: NaiveDate) -> bool {
        self.schedule.is_loaded(day)
    }

    // Loaded days in date order.
    pub fn loaded_days(&self) -> impl Iterator<Item = &Day> {
        self.schedule.loaded_days()
    }

    pub fn incomplete_tasks(&self) -> &[Task] {
        self.tasks.incomplete()
    }

    pub fn missed_executions(&self) -> &[TaskExecution] {
        self.schedule.missed()
    }

    pub fn find_execution(&self, id: ExecutionId) -> Option<&TaskExecution> {
        self.schedule.find_execution(id)
    }

    pub fn find_exchange_candidate(
        &self,
        execution: &TaskExecution,
        direction: Direction,
    ) -> Option<TaskExecution> {
        self.schedule.find_exchange_candidate(execution, direction)
    }

    // ----- task events -----

    // Returns how many records were rejected.
    pub fn set_incomplete<I: IntoTask>(&mut self, tasks: Vec<I>) -> usize {
        let (tasks, rejected) = normalize_all(tasks, I::into_task);
        self.tasks.set_incomplete(tasks);
        rejected
    }

    pub fn upsert_task(&mut self, task: impl IntoTask) -> Result<()> {
        self.tasks.upsert(task.into_task()?);
        Ok(())
    }

    pub fn remove_task(&mut self, task_id: TaskId) {
        self.tasks.remove(task_id);
    }

    // Fan the new task value out to every execution and the incomplete index.
    pub fn propagate_task_update(&mut self, task: impl IntoTask) -> Result<usize> {
        let task = task.into_task()?;
        let touched = self.schedule.replace_task(&task);
        if touched == 0 {
            debug!(task_id = task.id, "no executions reference updated task");
        }
        self.tasks.upsert(task);
        Ok(touched)
    }

    // ----- schedule events -----

    // Returns how many records were rejected.
    pub fn set_day<I: IntoTaskExecution>(
        &mut self,
        day: NaiveDate,
        max_duration: Duration,
        executions: Vec<I>,
        now: DateTime<FixedOffset>,
    ) -> usize {
        let (executions, rejected) = normalize_all(executions, I::into_task_execution);
        self.schedule.set_day(day, max_duration, executions, now);
        rejected
    }

    pub fn apply_day_payload(&mut self, payload: DayPayload, now: DateTime<FixedOffset>) -> Result<usize> {
        let day = dates::parse_day(&payload.day)?;
        let max_duration: Duration = payload.max_duration.parse()?;
        Ok(self.set_day(day, max_duration, payload.executions, now))
    }

    pub fn upsert_execution(
        &mut self,
        execution: impl IntoTaskExecution,
        now: DateTime<FixedOffset>,
    ) -> Result<TaskExecution> {
        let execution = execution.into_task_execution()?;
        self.schedule.upsert_execution(execution.clone(), now);
        Ok(execution)
    }

    pub fn remove_execution(&mut self, id: ExecutionId) -> bool {
        self.schedule.remove_execution(id)
    }

    pub fn set_missed<I: IntoTaskExecution>(&mut self, executions: Vec<I>) -> usize {
        let (executions, rejected) = normalize_all(executions, I::into_task_execution);
        self.schedule.set_missed(executions);
        rejected
    }
}
