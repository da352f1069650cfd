use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::forms::CredentialsForm;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::users::{self, NewUserRecord};
use crate::state::AppState;

/// GET /signup - registration page model
pub async fn page() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "title": "Sign Up",
        "form": {
            "action": "/signup",
            "fields": ["email", "password"]
        },
        "links": { "login": "/login" }
    })))
}

/// POST /signup - register with the remote store, then create the matching
/// profile row. The response schedules navigation to the sign-in page after
/// two seconds via a refresh header.
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    state.store.sign_up(&form.email, &form.password).await?;

    // Profile row insert. A failure here has no user-visible effect; the
    // account exists either way.
    if let Err(e) = users::insert(
        &state.store,
        &state.cache,
        vec![NewUserRecord {
            email: form.email.clone(),
        }],
    )
    .await
    {
        tracing::warn!("user record insert failed after sign-up for {}: {}", form.email, e);
    }

    let headers = [(
        HeaderName::from_static("refresh"),
        HeaderValue::from_static("2;url=/login"),
    )];

    Ok((
        headers,
        ApiResponse::success(json!({
            "message": "Signup successful! Check your email for confirmation."
        })),
    ))
}
