// --------------------------------------------------
// HTTP handlers for tasks.
//
// Responsibilities:
// - Get / replace the incomplete task list
// - Accept task update events and fan them out to executions
// - Drop a task from the incomplete list
// -------------------------------------------------

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::dates;
use crate::models::{Task, TaskId, TaskRecord};
use crate::routes_days::SetResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub incomplete_duration: crate::duration::Duration,
    pub start_in_future: bool,
}

fn view(task: &Task) -> TaskView {
    let today = dates::now_fixed_offset().date_naive();
    TaskView {
        task: task.clone(),
        incomplete_duration: task.incomplete_duration(),
        start_in_future: task.start_in_future(today),
    }
}

// -----------------------------
// GET /api/tasks/incomplete
// Incomplete tasks in display order
// -----------------------------
pub async fn get_incomplete(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let tasks: Vec<TaskView> = store.incomplete_tasks().iter().map(view).collect();
    Json(tasks).into_response()
}

// -----------------------------
// PUT /api/tasks/incomplete
// Replaces the incomplete task list
// -----------------------------
pub async fn put_incomplete(
    State(state): State<AppState>,
    Json(records): Json<Vec<TaskRecord>>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    let rejected = store.set_incomplete(records);
    let tasks: Vec<TaskView> = store.incomplete_tasks().iter().map(view).collect();
    Json(SetResponse {
        rejected,
        value: serde_json::json!({ "tasks": tasks }),
    })
    .into_response()
}

// -----------------------------
// PUT /api/tasks
// A task changed: update every execution embedding it
// -----------------------------
pub async fn put_task(
    State(state): State<AppState>,
    Json(record): Json<TaskRecord>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    match store.propagate_task_update(record) {
        Ok(touched) => Json(serde_json::json!({ "ok": true, "executions": touched })).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// -----------------------------
// DELETE /api/tasks/:id
// Drops a task from the incomplete list
// -----------------------------
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<TaskId>) -> impl IntoResponse {
    state.store.write().await.remove_task(id);
    Json(serde_json::json!({ "ok": true })).into_response()
}
