use axum::{extract::State, response::Redirect, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::forms::CredentialsForm;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /login - sign-in page model
pub async fn page() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "title": "Login",
        "form": {
            "action": "/login",
            "fields": ["email", "password"]
        },
        "links": { "signup": "/signup" }
    })))
}

/// POST /login - authenticate against the remote store and open a session.
/// On success the browser is sent to the dashboard.
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<Redirect, ApiError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    let session = state.store.sign_in(&form.email, &form.password).await?;
    state.session.set(Some(session.user));

    Ok(Redirect::to("/dashboard"))
}
