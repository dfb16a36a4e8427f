// Define data modules
pub mod config; // Environment configuration
pub mod dates; // Calendar day helpers and relative-day labels
pub mod duration; // Exact decimal durations
pub mod error; // Error type shared by every module
pub mod logic; // Ordering rules for tasks and day buckets
pub mod models; // Task, TaskExecution, Day and their wire records
pub mod remote; // Remote service contract + remote-backed handlers
pub mod routes_days; // HTTP handlers for days, executions, missed
pub mod routes_tasks; // HTTP handlers for incomplete tasks
pub mod store; // In-memory scheduling state

use std::sync::Arc;

// Import axum routing utilities and Router
use axum::{
    routing::{get, put},
    Router,
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{Error, Result};
pub use store::PlannerStore;

// Shared between handlers. One lock over the whole store: propagation touches every bucket.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<PlannerStore>>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: PlannerStore, config: Config) -> Self {
        AppState {
            store: Arc::new(RwLock::new(store)),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // days
        .route("/days", get(routes_days::get_days).put(routes_days::put_day))
        .route("/days/:day", get(routes_days::get_day))
        .route("/days/:day/exchange/:id", get(routes_days::get_exchange))
        // executions
        .route("/executions", put(routes_days::put_execution))
        .route("/executions/:id", axum::routing::delete(routes_days::delete_execution))
        .route("/missed", get(routes_days::get_missed).put(routes_days::put_missed))
        // tasks
        .route("/tasks", put(routes_tasks::put_task))
        .route("/tasks/:id", axum::routing::delete(routes_tasks::delete_task))
        .route(
            "/tasks/incomplete",
            get(routes_tasks::get_incomplete).put(routes_tasks::put_incomplete),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(PlannerStore::new(), Config::default()))
    }

    fn task_json(id: i64, name: &str) -> Value {
        json!({
            "id": id, "name": name, "duration": "4", "scheduled_duration": "1",
            "finished_duration": "0", "default_schedule_duration": "1", "start": null
        })
    }

    fn execution_json(id: i64, day: &str, order: i64, finished: bool) -> Value {
        json!({
            "id": id, "task": task_json(10, "write"), "day": day,
            "day_order": order, "duration": "1.5", "finished": finished
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn unknown_day_is_empty() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/days/2099-01-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_duration"], "0");
        assert_eq!(body["executions"].as_array().unwrap().len(), 0);

        let (status, _) = send(&app, "GET", "/api/days/not-a-day", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn put_day_then_upsert_and_exchange() {
        let app = app();
        let payload = json!({
            "day": "2099-01-01",
            "executions": [execution_json(1, "2099-01-01", 2, false), execution_json(2, "2099-01-01", 1, false)]
        });
        let (status, body) = send(&app, "PUT", "/api/days", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rejected"], 0);
        assert_eq!(body["max_duration"], "8");
        assert_eq!(body["scheduled_duration"], "3");
        assert_eq!(body["executions"][0]["id"], 2);

        let (status, _) = send(&app, "PUT", "/api/executions", Some(execution_json(3, "2099-01-01", 3, true))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/api/days/2099-01-01/exchange/2?direction=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (status, _) = send(&app, "GET", "/api/days/2099-01-01/exchange/2?direction=-1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/api/days/2099-01-01/exchange/2?direction=2", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_execution_record_is_rejected() {
        let app = app();
        let mut bad = execution_json(1, "2099-01-01", 1, false);
        bad["duration"] = json!("1.2.3");
        let (status, _) = send(&app, "PUT", "/api/executions", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "DELETE", "/api/executions/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], false);
    }

    #[tokio::test]
    async fn missed_round_trip() {
        let app = app();
        let list = json!([execution_json(5, "2000-01-01", 1, false)]);
        let (status, body) = send(&app, "PUT", "/api/missed", Some(list)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["missed"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, "GET", "/api/missed", None).await;
        assert_eq!(body[0]["id"], 5);
    }

    #[tokio::test]
    async fn task_updates_reach_incomplete_list() {
        let app = app();
        let list = json!([task_json(1, "b"), task_json(2, "a")]);
        let (status, body) = send(&app, "PUT", "/api/tasks/incomplete", Some(list)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"][0]["name"], "a");
        assert_eq!(body["tasks"][0]["incomplete_duration"], "3");

        let mut done = task_json(1, "b");
        done["scheduled_duration"] = json!("4");
        let (status, body) = send(&app, "PUT", "/api/tasks", Some(done)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["executions"], 0);

        let (_, body) = send(&app, "GET", "/api/tasks/incomplete", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        send(&app, "DELETE", "/api/tasks/2", None).await;
        let (_, body) = send(&app, "GET", "/api/tasks/incomplete", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }
}
