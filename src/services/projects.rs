use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::store::{SelectQuery, StoreClient, StoreError};

pub const TABLE: &str = "projects";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct NewProject {
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fetch all projects, serving from the query cache when possible.
pub async fn fetch(store: &StoreClient, cache: &QueryCache) -> Result<Vec<Project>, StoreError> {
    if let Some(rows) = cache.get(TABLE, None) {
        return parse_rows(rows);
    }

    let rows = store.select(TABLE, SelectQuery::all()).await?;
    cache.put(TABLE, None, &rows);
    parse_rows(Value::Array(rows))
}

pub async fn insert(
    store: &StoreClient,
    cache: &QueryCache,
    record: NewProject,
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
    changes: ProjectChanges,
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

fn parse_rows(rows: Value) -> Result<Vec<Project>, StoreError> {
    serde_json::from_value(rows).map_err(|e| StoreError::UnexpectedBody(e.to_string()))
}

fn to_body(record: &impl Serialize) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::UnexpectedBody(e.to_string()))
}
