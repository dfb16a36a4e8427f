use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_planner::{dates, store, AppState, Config, PlannerStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_planner=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    let planner_store = match &config.seed_file {
        Some(path) => {
            let loaded = store::load_snapshot(path)
                .and_then(|snapshot| PlannerStore::from_snapshot(snapshot, dates::now_fixed_offset()));
            match loaded {
                Ok(s) => {
                    info!(path = %path.display(), "store seeded");
                    s
                }
                Err(e) => {
                    error!(path = %path.display(), "failed to load seed file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => PlannerStore::new(),
    };

    let addr = config.bind_addr;
    let app = task_planner::router(AppState::new(planner_store, config));

    // Print the link to the server
    info!("Server running at http://{}", addr);
    info!("API base:        http://{}/api", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("bind failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
