use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dates::{self, NaturalDay};
use crate::duration::Duration;
use crate::error::Result;

pub type TaskId = i64;
pub type ExecutionId = i64;

// ------------------------------------------------------------
// Wire records, as exchanged with the remote service.
// Decimal fields stay strings until normalization.
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub duration: String,
    pub scheduled_duration: String,
    pub finished_duration: String,
    pub default_schedule_duration: String,
    #[serde(default)]
    pub start: Option<String>, // "YYYY-MM-DD" or null
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskExecutionRecord {
    pub id: ExecutionId,
    pub task: TaskRecord,
    pub day: String, // "YYYY-MM-DD"
    pub day_order: i64,
    pub duration: String,
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPayload {
    pub day: String, // "YYYY-MM-DD"
    pub max_duration: String,
    pub executions: Vec<TaskExecutionRecord>,
}

// ------------------------------------------------------------
// Normalized entities
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub duration: Duration,
    pub scheduled_duration: Duration,
    pub finished_duration: Duration,
    pub default_schedule_duration: Duration,
    pub start: Option<NaiveDate>,
}

impl Task {
    // duration - scheduled_duration; negative means the remote broke its contract
    pub fn incomplete_duration(&self) -> Duration {
        let incomplete = self.duration - self.scheduled_duration;
        if incomplete.is_negative() {
            warn!(
                task_id = self.id,
                duration = %self.duration,
                scheduled = %self.scheduled_duration,
                "task scheduled beyond its duration"
            );
        }
        incomplete
    }

    pub fn incomplete(&self) -> bool {
        self.incomplete_duration().is_positive()
    }

    pub fn start_in_future(&self, today: NaiveDate) -> bool {
        self.start.is_some_and(|start| start > today)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskExecution {
    pub id: ExecutionId,
    pub task: Task, // copy as of last sync
    pub day: NaiveDate,
    pub day_order: i64,
    pub duration: Duration,
    pub finished: bool,
}

impl TaskExecution {
    pub fn past(&self, now: DateTime<FixedOffset>) -> bool {
        dates::is_past_day(self.day, now)
    }

    pub fn missed(&self, now: DateTime<FixedOffset>) -> bool {
        !self.finished && self.past(now)
    }

    pub fn natural_day(&self, today: NaiveDate) -> NaturalDay {
        dates::natural_day(self.day, today)
    }
}

// View over the executions of one date; rebuilt, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Day {
    pub day: NaiveDate,
    pub max_duration: Duration,
    pub executions: Vec<TaskExecution>,
}

impl Day {
    pub fn scheduled_duration(&self) -> Duration {
        self.executions.iter().map(|e| e.duration).sum()
    }

    pub fn finished_duration(&self) -> Duration {
        self.executions
            .iter()
            .filter(|e| e.finished)
            .map(|e| e.duration)
            .sum()
    }

    pub fn remaining_duration(&self) -> Duration {
        self.scheduled_duration() - self.finished_duration()
    }

    pub fn overloaded(&self) -> bool {
        self.scheduled_duration() > self.max_duration
    }

    pub fn past(&self, now: DateTime<FixedOffset>) -> bool {
        dates::is_past_day(self.day, now)
    }

    pub fn today(&self, now: DateTime<FixedOffset>) -> bool {
        dates::is_today(self.day, now)
    }

    pub fn natural_day(&self, today: NaiveDate) -> NaturalDay {
        dates::natural_day(self.day, today)
    }
}

// Executions must already be in bucket order; no sorting happens here.
pub fn build_day(day: NaiveDate, max_duration: Duration, executions: Vec<TaskExecution>) -> Day {
    Day {
        day,
        max_duration,
        executions,
    }
}

// Summary sent to UI clients alongside the raw day.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub day: String,
    pub natural_day: String,
    pub max_duration: Duration,
    pub scheduled_duration: Duration,
    pub finished_duration: Duration,
    pub remaining_duration: Duration,
    pub overloaded: bool,
    pub past: bool,
    pub executions: Vec<TaskExecution>,
}

impl DaySummary {
    pub fn new(day: &Day, now: DateTime<FixedOffset>) -> Self {
        DaySummary {
            day: dates::format_day(day.day),
            natural_day: day.natural_day(now.date_naive()).to_string(),
            max_duration: day.max_duration,
            scheduled_duration: day.scheduled_duration(),
            finished_duration: day.finished_duration(),
            remaining_duration: day.remaining_duration(),
            overloaded: day.overloaded(),
            past: day.past(now),
            executions: day.executions.clone(),
        }
    }
}

// ------------------------------------------------------------
// Normalization
//     Callers hold either an entity or a record; both convert.
//     Converting an entity is the identity.
// ------------------------------------------------------------

pub trait IntoTask {
    fn into_task(self) -> Result<Task>;
}

pub trait IntoTaskExecution {
    fn into_task_execution(self) -> Result<TaskExecution>;
}

impl IntoTask for Task {
    fn into_task(self) -> Result<Task> {
        Ok(self)
    }
}

impl IntoTask for TaskRecord {
    fn into_task(self) -> Result<Task> {
        let start = match self.start.as_deref() {
            None | Some("") => None,
            Some(s) => Some(dates::parse_day(s)?),
        };
        Ok(Task {
            id: self.id,
            name: self.name,
            duration: self.duration.parse()?,
            scheduled_duration: self.scheduled_duration.parse()?,
            finished_duration: self.finished_duration.parse()?,
            default_schedule_duration: self.default_schedule_duration.parse()?,
            start,
        })
    }
}

impl IntoTaskExecution for TaskExecution {
    fn into_task_execution(self) -> Result<TaskExecution> {
        Ok(self)
    }
}

impl IntoTaskExecution for TaskExecutionRecord {
    fn into_task_execution(self) -> Result<TaskExecution> {
        Ok(TaskExecution {
            id: self.id,
            task: self.task.into_task()?,
            day: dates::parse_day(&self.day)?,
            day_order: self.day_order,
            duration: self.duration.parse()?,
            finished: self.finished,
        })
    }
}

pub fn to_task(input: impl IntoTask) -> Result<Task> {
    input.into_task()
}

pub fn to_task_execution(input: impl IntoTaskExecution) -> Result<TaskExecution> {
    input.into_task_execution()
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        TaskRecord {
            id: task.id,
            name: task.name.clone(),
            duration: task.duration.to_string(),
            scheduled_duration: task.scheduled_duration.to_string(),
            finished_duration: task.finished_duration.to_string(),
            default_schedule_duration: task.default_schedule_duration.to_string(),
            start: task.start.map(dates::format_day),
        }
    }
}

impl From<&TaskExecution> for TaskExecutionRecord {
    fn from(execution: &TaskExecution) -> Self {
        TaskExecutionRecord {
            id: execution.id,
            task: TaskRecord::from(&execution.task),
            day: dates::format_day(execution.day),
            day_order: execution.day_order,
            duration: execution.duration.to_string(),
            finished: execution.finished,
        }
    }
}
