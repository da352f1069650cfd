use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use tracker_api_rust::handlers::{protected, public};
use tracker_api_rust::middleware::session_guard;
use tracker_api_rust::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up STORE_URL, STORE_API_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = tracker_api_rust::config::config();
    tracing::info!("Starting Tracker API in {:?} mode", config.environment);

    let state = AppState::from_config(config).await?;
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("TRACKER_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("🚀 Tracker API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_page_routes())
        .merge(protected_page_routes())
        // Session guard runs on every navigation; the public allow-list
        // lives inside it
        .layer(axum_middleware::from_fn_with_state(state.clone(), session_guard))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_page_routes() -> Router<AppState> {
    use public::{login, signup};

    Router::new()
        .route("/login", get(login::page).post(login::submit))
        .route("/signup", get(signup::page).post(signup::submit))
}

fn protected_page_routes() -> Router<AppState> {
    use protected::{dashboard, project, task};

    Router::new()
        .route("/dashboard", get(dashboard::page))
        .route("/logout", post(dashboard::logout))
        .route("/project", get(project::page).post(project::submit))
        .route("/project/:id/delete", post(project::delete))
        .route("/task", get(task::page).post(task::submit))
        .route("/task/:id/delete", post(task::delete))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Tracker API (Rust)",
            "version": version,
            "description": "Project/task tracking web app backed by a hosted data store",
            "routes": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/login (public)",
                "signup": "/signup (public)",
                "dashboard": "/dashboard (protected)",
                "project": "/project[?edit=:id] (protected)",
                "task": "/task[?project_id=:id][&edit=:id] (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}
