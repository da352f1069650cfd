#![allow(dead_code)]

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::redirect::Policy;
use serde_json::{json, Value};
use uuid::Uuid;

/// In-memory stand-in for the hosted store: table CRUD under /rest/v1 and
/// session endpoints under /auth/v1, with per-operation call counters so
/// tests can assert exactly which remote calls an action issued.
#[derive(Default)]
pub struct StoreState {
    /// email -> (user id, password)
    auth_users: Mutex<HashMap<String, (Uuid, String)>>,
    /// access token -> (user id, email)
    tokens: Mutex<HashMap<String, (Uuid, String)>>,
    tables: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<HashMap<String, usize>>,
    /// Table whose inserts fail with a 500, for failure-path tests.
    fail_inserts: Mutex<Option<String>>,
}

impl StoreState {
    fn bump(&self, key: String) {
        *self.calls.lock().unwrap().entry(key).or_insert(0) += 1;
    }
}

pub struct MockStore {
    pub base_url: String,
    pub state: Arc<StoreState>,
}

impl MockStore {
    pub async fn spawn() -> Result<Self> {
        let state = Arc::new(StoreState::default());
        let router = store_router(Arc::clone(&state));

        let port = portpicker::pick_unused_port().context("failed to pick free port for mock store")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock store listener")?;
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("mock store server");
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        })
    }

    /// Register an auth identity the app can sign in with.
    pub fn register_user(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .auth_users
            .lock()
            .unwrap()
            .insert(email.to_string(), (id, password.to_string()));
        id
    }

    /// Mint a valid access token for a registered identity, as if a prior
    /// session had been persisted.
    pub fn issue_token(&self, email: &str) -> String {
        let id = self
            .state
            .auth_users
            .lock()
            .unwrap()
            .get(email)
            .map(|(id, _)| *id)
            .expect("issue_token requires a registered user");
        let token = format!("tok-{}", Uuid::new_v4());
        self.state
            .tokens
            .lock()
            .unwrap()
            .insert(token.clone(), (id, email.to_string()));
        token
    }

    pub fn seed_row(&self, table: &str, row: Value) {
        self.state
            .tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Count of calls recorded under a key like "GET projects" or "POST signup".
    pub fn calls(&self, key: &str) -> usize {
        self.state.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn fail_inserts_into(&self, table: &str) {
        *self.state.fail_inserts.lock().unwrap() = Some(table.to_string());
    }
}

fn store_router(state: Arc<StoreState>) -> Router {
    Router::new()
        .route("/auth/v1/token", post(auth_token))
        .route("/auth/v1/signup", post(auth_signup))
        .route("/auth/v1/logout", post(auth_logout))
        .route("/auth/v1/user", get(auth_user))
        .route("/auth/v1/health", get(auth_health))
        .route(
            "/rest/v1/:table",
            get(rest_get).post(rest_post).patch(rest_patch).delete(rest_delete),
        )
        .with_state(state)
}

fn session_json(token: &str, id: Uuid, email: &str) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": id, "email": email }
    })
}

async fn auth_token(
    State(state): State<Arc<StoreState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.bump("POST token".to_string());

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    let found = state.auth_users.lock().unwrap().get(&email).cloned();
    match found {
        Some((id, stored)) if stored == password => {
            let token = format!("tok-{}", Uuid::new_v4());
            state
                .tokens
                .lock()
                .unwrap()
                .insert(token.clone(), (id, email.clone()));
            (StatusCode::OK, Json(session_json(&token, id, &email)))
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error_description": "Invalid login credentials" })),
        ),
    }
}

async fn auth_signup(
    State(state): State<Arc<StoreState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.bump("POST signup".to_string());

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if state.auth_users.lock().unwrap().contains_key(&email) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "msg": "User already registered" })),
        );
    }

    let id = Uuid::new_v4();
    state
        .auth_users
        .lock()
        .unwrap()
        .insert(email.clone(), (id, password));

    let token = format!("tok-{}", Uuid::new_v4());
    state
        .tokens
        .lock()
        .unwrap()
        .insert(token.clone(), (id, email.clone()));

    (StatusCode::OK, Json(session_json(&token, id, &email)))
}

async fn auth_logout(State(state): State<Arc<StoreState>>) -> StatusCode {
    state.bump("POST logout".to_string());
    StatusCode::NO_CONTENT
}

async fn auth_user(
    State(state): State<Arc<StoreState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.bump("GET user".to_string());

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();

    match state.tokens.lock().unwrap().get(&token) {
        Some((id, email)) => (StatusCode::OK, Json(json!({ "id": id, "email": email }))),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))),
    }
}

async fn auth_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn matches_filters(row: &Value, params: &HashMap<String, String>) -> bool {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != "select")
        .all(|(key, value)| match value.strip_prefix("eq.") {
            Some(want) => match row.get(key) {
                Some(Value::String(s)) => s == want,
                Some(other) => other.to_string() == want,
                None => false,
            },
            None => true,
        })
}

async fn rest_get(
    State(state): State<Arc<StoreState>>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.bump(format!("GET {}", table));

    let mut rows: Vec<Value> = state
        .tables
        .lock()
        .unwrap()
        .get(&table)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|row| matches_filters(row, &params))
        .collect();

    // Embedded join projection: select=*,projects(name)
    let wants_project_join = params
        .get("select")
        .map(|s| s.contains("projects(name)"))
        .unwrap_or(false);
    if wants_project_join {
        let projects = state
            .tables
            .lock()
            .unwrap()
            .get("projects")
            .cloned()
            .unwrap_or_default();
        for row in &mut rows {
            let project_id = row.get("project_id").cloned();
            let name = projects
                .iter()
                .find(|p| p.get("id") == project_id.as_ref())
                .and_then(|p| p.get("name"))
                .cloned();
            if let Some(name) = name {
                row["projects"] = json!({ "name": name });
            }
        }
    }

    Json(Value::Array(rows))
}

async fn rest_post(
    State(state): State<Arc<StoreState>>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.bump(format!("POST {}", table));

    if state.fail_inserts.lock().unwrap().as_deref() == Some(table.as_str()) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "insert disabled by test" })),
        );
    }

    let incoming = match body {
        Value::Array(rows) => rows,
        single => vec![single],
    };

    let mut inserted = Vec::new();
    for mut row in incoming {
        if row.get("id").is_none() {
            row["id"] = json!(Uuid::new_v4());
        }
        inserted.push(row);
    }

    state
        .tables
        .lock()
        .unwrap()
        .entry(table)
        .or_default()
        .extend(inserted.clone());

    (StatusCode::CREATED, Json(Value::Array(inserted)))
}

async fn rest_patch(
    State(state): State<Arc<StoreState>>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.bump(format!("PATCH {}", table));

    let mut tables = state.tables.lock().unwrap();
    if let Some(rows) = tables.get_mut(&table) {
        for row in rows.iter_mut().filter(|row| matches_filters(row, &params)) {
            if let (Some(row), Some(changes)) = (row.as_object_mut(), body.as_object()) {
                for (key, value) in changes {
                    row.insert(key.clone(), value.clone());
                }
            }
        }
    }

    StatusCode::NO_CONTENT
}

async fn rest_delete(
    State(state): State<Arc<StoreState>>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    state.bump(format!("DELETE {}", table));

    let mut tables = state.tables.lock().unwrap();
    if let Some(rows) = tables.get_mut(&table) {
        rows.retain(|row| !matches_filters(row, &params));
    }

    StatusCode::NO_CONTENT
}

/// A running app instance wired to its own mock store.
pub struct TestEnv {
    pub base_url: String,
    pub store: MockStore,
    child: Child,
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn spawn() -> Result<TestEnv> {
    let store = MockStore::spawn().await?;
    spawn_against(store, &[]).await
}

/// Spawn the app against a store that has already been seeded, optionally
/// with extra environment (e.g. a persisted access token).
pub async fn spawn_against(store: MockStore, extra_env: &[(&str, String)]) -> Result<TestEnv> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tracker-api-rust"));
    cmd.env("APP_ENV", "development")
        .env("TRACKER_PORT", port.to_string())
        .env("STORE_URL", store.base_url.clone())
        .env("STORE_API_KEY", "test-api-key")
        .env("RUST_LOG", "warn")
        .env_remove("STORE_ACCESS_TOKEN")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    for (key, value) in extra_env {
        cmd.env(key, value);
    }

    let child = cmd.spawn().context("failed to spawn server binary")?;

    let env = TestEnv {
        base_url,
        store,
        child,
    };
    env.wait_ready(Duration::from_secs(10)).await?;
    Ok(env)
}

impl TestEnv {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            match client.get(self.url("/health")).send().await {
                Ok(resp)
                    if resp.status() == reqwest::StatusCode::OK
                        || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE =>
                {
                    return Ok(());
                }
                _ => {}
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Sign in through the app; fails on anything but the expected redirect.
    pub async fn login(&self, client: &reqwest::Client, email: &str, password: &str) -> Result<()> {
        let res = client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(
            res.status() == reqwest::StatusCode::SEE_OTHER,
            "login did not redirect: {}",
            res.status()
        );
        Ok(())
    }
}

/// Client that surfaces redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("reqwest client")
}
