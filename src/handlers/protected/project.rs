use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::forms::ProjectForm;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::projects::{self, NewProject, ProjectChanges};
use crate::services::users;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Switches the form to edit mode for the named row.
    pub edit: Option<Uuid>,
}

/// GET /project - project form + list page model. `?edit=<id>` loads that
/// row's current values into the form.
pub async fn page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Value> {
    let rows = projects::fetch(&state.store, &state.cache).await?;

    let form = match query.edit {
        Some(id) => {
            let row = rows
                .iter()
                .find(|p| p.id == id)
                .ok_or_else(|| ApiError::not_found("Project not found"))?;
            json!({
                "mode": "edit",
                "id": row.id,
                "values": { "name": row.name, "description": row.description }
            })
        }
        None => json!({
            "mode": "create",
            "values": { "name": "", "description": "" }
        }),
    };

    Ok(ApiResponse::success(json!({
        "title": "Project",
        "form": form,
        "projects": rows,
        "confirm_delete": "Are you sure you want to delete this project?"
    })))
}

/// POST /project - create a project, or update one when the form carries an
/// id. Validation failures never reach the store.
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<ProjectForm>,
) -> ApiResult<Value> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    let message = match form.id {
        Some(id) => {
            projects::update(
                &state.store,
                &state.cache,
                id,
                ProjectChanges {
                    name: Some(form.name),
                    description: Some(form.description),
                },
            )
            .await?;
            "Project updated successfully!"
        }
        None => {
            // The owning user id comes from the profile row keyed by the
            // session's email.
            let owner = users::fetch_by_email(&state.store, &state.cache, &user.email).await?;
            projects::insert(
                &state.store,
                &state.cache,
                NewProject {
                    user_id: owner.id,
                    name: form.name,
                    description: form.description,
                },
            )
            .await?;
            "Project created successfully!"
        }
    };

    Ok(ApiResponse::success(json!({ "message": message })))
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteRequest {
    #[serde(default)]
    pub confirmed: bool,
}

/// POST /project/:id/delete - remove a project. Requires the confirmation
/// flag; a declined confirmation issues no store call.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Value> {
    if !request.confirmed {
        return Err(ApiError::bad_request("Delete not confirmed"));
    }

    projects::delete(&state.store, &state.cache, id).await?;

    Ok(ApiResponse::success(json!({ "message": "Project deleted" })))
}
