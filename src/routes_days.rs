// --------------------------------------------------
// HTTP handlers for the schedule: day buckets, executions
// and the missed backlog.
//
// Responsibilities:
// - Query a day (with derived durations) / replace a day
// - Upsert / delete a single execution
// - Find the exchange partner of an execution
// - Get / replace the missed list
// --------------------------------------------------

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dates;
use crate::duration::Duration;
use crate::logic::Direction;
use crate::models::{DaySummary, ExecutionId, TaskExecution, TaskExecutionRecord};
use crate::AppState;

// -----------------------------
// GET /api/days
// Every loaded day, oldest first
// -----------------------------
pub async fn get_days(State(state): State<AppState>) -> impl IntoResponse {
    let now = dates::now_fixed_offset();
    let store = state.store.read().await;
    let days: Vec<DaySummary> = store.loaded_days().map(|d| DaySummary::new(d, now)).collect();
    Json(days).into_response()
}

// -----------------------------
// GET /api/days/:day
// Returns the bucket with derived durations; unknown days are empty
// -----------------------------
pub async fn get_day(State(state): State<AppState>, Path(day): Path<String>) -> impl IntoResponse {
    let day = match dates::parse_day(&day) {
        Ok(d) => d,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let now = dates::now_fixed_offset();

    let store = state.store.read().await;
    Json(DaySummary::new(&store.query_day(day), now)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct DayInput {
    pub day: String, // "YYYY-MM-DD"
    pub max_duration: Option<Duration>,
    #[serde(default)]
    pub executions: Vec<TaskExecutionRecord>,
}

#[derive(Debug, Serialize)]
pub struct SetResponse<T> {
    pub rejected: usize,
    #[serde(flatten)]
    pub value: T,
}

// -----------------------------
// PUT /api/days
// Replaces one day bucket wholesale
// -----------------------------
pub async fn put_day(State(state): State<AppState>, Json(input): Json<DayInput>) -> impl IntoResponse {
    let day = match dates::parse_day(&input.day) {
        Ok(d) => d,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let max_duration = input.max_duration.unwrap_or(state.config.default_max_duration);
    let now = dates::now_fixed_offset();

    let mut store = state.store.write().await;
    let rejected = store.set_day(day, max_duration, input.executions, now);
    info!(day = %day, rejected, "day replaced");

    Json(SetResponse {
        rejected,
        value: DaySummary::new(&store.query_day(day), now),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ExchangeQuery {
    pub direction: i64, // 1 or -1
}

// -----------------------------
// GET /api/days/:day/exchange/:id?direction=1
// Finds the neighbour an execution would swap with
// -----------------------------
pub async fn get_exchange(
    State(state): State<AppState>,
    Path((day, id)): Path<(String, ExecutionId)>,
    Query(q): Query<ExchangeQuery>,
) -> impl IntoResponse {
    let day = match dates::parse_day(&day) {
        Ok(d) => d,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let direction = match Direction::try_from(q.direction) {
        Ok(d) => d,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let store = state.store.read().await;
    let bucket = store.query_day(day);
    let Some(execution) = bucket.executions.iter().find(|e| e.id == id) else {
        return (StatusCode::NOT_FOUND, "task execution not found").into_response();
    };

    match store.find_exchange_candidate(execution, direction) {
        Some(other) => Json(other).into_response(),
        None => (StatusCode::NOT_FOUND, "no exchange candidate").into_response(),
    }
}

// -----------------------------
// PUT /api/executions
// Inserts or moves a single execution
// -----------------------------
pub async fn put_execution(
    State(state): State<AppState>,
    Json(record): Json<TaskExecutionRecord>,
) -> impl IntoResponse {
    let now = dates::now_fixed_offset();
    let mut store = state.store.write().await;
    match store.upsert_execution(record, now) {
        Ok(execution) => Json(execution).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// -----------------------------
// DELETE /api/executions/:id
// Removes an execution from every day and from missed
// -----------------------------
pub async fn delete_execution(
    State(state): State<AppState>,
    Path(id): Path<ExecutionId>,
) -> impl IntoResponse {
    let removed = state.store.write().await.remove_execution(id);
    Json(serde_json::json!({ "ok": true, "removed": removed })).into_response()
}

// -----------------------------
// GET /api/missed
// -----------------------------
pub async fn get_missed(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;
    let missed: Vec<TaskExecution> = store.missed_executions().to_vec();
    Json(missed).into_response()
}

// -----------------------------
// PUT /api/missed
// Replaces the missed list wholesale
// -----------------------------
pub async fn put_missed(
    State(state): State<AppState>,
    Json(records): Json<Vec<TaskExecutionRecord>>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    let rejected = store.set_missed(records);
    Json(SetResponse {
        rejected,
        value: serde_json::json!({ "missed": store.missed_executions() }),
    })
    .into_response()
}
