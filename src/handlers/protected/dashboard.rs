use axum::{extract::State, response::Redirect, Extension};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// GET /dashboard - identity card for the signed-in user
pub async fn page(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "title": "Dashboard",
        "user": {
            "id": user.id,
            "email": user.email
        },
        "links": {
            "projects": "/project",
            "tasks": "/task"
        },
        "actions": { "logout": "/logout" }
    })))
}

/// POST /logout - close the remote session and return to sign-in
pub async fn logout(State(state): State<AppState>) -> Redirect {
    if let Err(e) = state.store.sign_out().await {
        tracing::warn!("remote sign-out failed: {}", e);
    }
    state.session.set(None);

    Redirect::to("/login")
}
