use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::forms::{field_error, TaskForm};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::projects;
use crate::services::tasks::{self, NewTask, TaskChanges, TaskStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Restricts the list to tasks of one project.
    pub project_id: Option<Uuid>,
    /// Switches the form to edit mode for the named row.
    pub edit: Option<Uuid>,
}

/// GET /task - task form + list page model. The list honours
/// `?project_id=<id>` and every row carries the joined project name; the
/// form offers the status enumeration and the project list as options.
pub async fn page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Value> {
    let rows = tasks::fetch(&state.store, &state.cache, query.project_id).await?;
    let project_rows = projects::fetch(&state.store, &state.cache).await?;

    let form = match query.edit {
        Some(id) => {
            let row = rows
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| ApiError::not_found("Task not found"))?;
            json!({
                "mode": "edit",
                "id": row.id,
                "values": {
                    "title": row.title,
                    "status": row.status.as_str(),
                    "project_id": row.project_id
                }
            })
        }
        None => json!({
            "mode": "create",
            "values": { "title": "", "status": "", "project_id": "" }
        }),
    };

    let project_options: Vec<Value> = project_rows
        .iter()
        .map(|p| json!({ "id": p.id, "name": p.name }))
        .collect();

    Ok(ApiResponse::success(json!({
        "title": "Task",
        "form": form,
        "status_options": TaskStatus::OPTIONS,
        "project_options": project_options,
        "tasks": rows,
        "confirm_delete": "Are you sure you want to delete this task?"
    })))
}

/// POST /task - create a task, or update one when the form carries an id.
pub async fn submit(State(state): State<AppState>, Json(form): Json<TaskForm>) -> ApiResult<Value> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    let status = TaskStatus::parse(&form.status).ok_or_else(|| {
        ApiError::validation_error(
            "Validation failed",
            Some(field_error("status", "Invalid task status")),
        )
    })?;
    let project_id = Uuid::parse_str(&form.project_id).map_err(|_| {
        ApiError::validation_error(
            "Validation failed",
            Some(field_error("project_id", "Invalid task project")),
        )
    })?;

    let message = match form.id {
        Some(id) => {
            tasks::update(
                &state.store,
                &state.cache,
                id,
                TaskChanges {
                    title: Some(form.title),
                    status: Some(status),
                    project_id: Some(project_id),
                },
            )
            .await?;
            "Task updated successfully!"
        }
        None => {
            tasks::insert(
                &state.store,
                &state.cache,
                NewTask {
                    title: form.title,
                    status,
                    project_id,
                },
            )
            .await?;
            "Task created successfully!"
        }
    };

    Ok(ApiResponse::success(json!({ "message": message })))
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteRequest {
    #[serde(default)]
    pub confirmed: bool,
}

/// POST /task/:id/delete - remove a task after explicit confirmation.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Value> {
    if !request.confirmed {
        return Err(ApiError::bad_request("Delete not confirmed"));
    }

    tasks::delete(&state.store, &state.cache, id).await?;

    Ok(ApiResponse::success(json!({ "message": "Task deleted" })))
}
