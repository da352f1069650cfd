use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::store::{SelectQuery, StoreClient, StoreError};

pub const TABLE: &str = "tasks";

/// Task reads always project the owning project's name alongside the row.
const SELECT_WITH_PROJECT: &str = "*,projects(name)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const OPTIONS: [&'static str; 3] = ["pending", "in_progress", "completed"];

    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Embedded project row carried by the join projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedProject {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub project_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<JoinedProject>,
}

#[derive(Debug, Serialize)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
}

/// Fetch tasks, optionally restricted to one project, each annotated with
/// the referenced project's name.
pub async fn fetch(
    store: &StoreClient,
    cache: &QueryCache,
    project_id: Option<Uuid>,
) -> Result<Vec<Task>, StoreError> {
    let filter = project_id.map(|id| id.to_string());

    if let Some(rows) = cache.get(TABLE, filter.as_deref()) {
        return parse_rows(rows);
    }

    let mut query = SelectQuery::columns(SELECT_WITH_PROJECT);
    if let Some(id) = &filter {
        query = query.eq("project_id", id);
    }

    let rows = store.select(TABLE, query).await?;
    cache.put(TABLE, filter.as_deref(), &rows);
    parse_rows(Value::Array(rows))
}

pub async fn insert(
    store: &StoreClient,
    cache: &QueryCache,
    record: NewTask,
) -> Result<Vec<Value>, StoreError> {
    let body = to_body(&record)?;
    let inserted = store.insert(TABLE, &body).await?;
    cache.invalidate(TABLE);
    Ok(inserted)
}

pub async fn update(
    store: &StoreClient,
    cache: &QueryCache,
    id: Uuid,
    changes: TaskChanges,
) -> Result<(), StoreError> {
    let body = to_body(&changes)?;
    store.update(TABLE, id, &body).await?;
    cache.invalidate(TABLE);
    Ok(())
}

pub async fn delete(store: &StoreClient, cache: &QueryCache, id: Uuid) -> Result<(), StoreError> {
    store.delete(TABLE, id).await?;
    cache.invalidate(TABLE);
    Ok(())
}

fn parse_rows(rows: Value) -> Result<Vec<Task>, StoreError> {
    serde_json::from_value(rows).map_err(|e| StoreError::UnexpectedBody(e.to_string()))
}

fn to_body(record: &impl Serialize) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::UnexpectedBody(e.to_string()))
}
