use serde_json::Value;
use uuid::Uuid;

use super::{StoreClient, StoreError};

/// Select options for a table read: which columns (including embedded join
/// projections like `*,projects(name)`) and an optional equality filter.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    columns: Option<&'static str>,
    filter: Option<(String, String)>,
}

impl SelectQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn columns(columns: &'static str) -> Self {
        Self {
            columns: Some(columns),
            filter: None,
        }
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filter = Some((column.to_string(), format!("eq.{}", value)));
        self
    }
}

impl StoreClient {
    /// GET /rest/v1/:table - select rows, optionally filtered and joined.
    /// Row order is whatever the store returns.
    pub async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>, StoreError> {
        let mut request = self
            .http
            .get(self.endpoint(&format!("rest/v1/{}", table)))
            .query(&[("select", query.columns.unwrap_or("*"))]);

        if let Some((column, value)) = &query.filter {
            request = request.query(&[(column.as_str(), value.as_str())]);
        }

        let response = Self::check(self.authorized(request).send().await?).await?;
        Ok(response.json().await?)
    }

    /// POST /rest/v1/:table - insert one row (or several, when given an
    /// array). Returns the inserted rows; may be empty depending on how the
    /// store is configured.
    pub async fn insert(&self, table: &str, rows: &Value) -> Result<Vec<Value>, StoreError> {
        let request = self
            .http
            .post(self.endpoint(&format!("rest/v1/{}", table)))
            .header("prefer", "return=representation")
            .json(rows);

        let response = Self::check(self.authorized(request).send().await?).await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&text) {
            Ok(Value::Array(inserted)) => Ok(inserted),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(StoreError::UnexpectedBody(e.to_string())),
        }
    }

    /// PATCH /rest/v1/:table?id=eq.:id - partial update of one row; only the
    /// provided fields change.
    pub async fn update(&self, table: &str, id: Uuid, changes: &Value) -> Result<(), StoreError> {
        let request = self
            .http
            .patch(self.endpoint(&format!("rest/v1/{}", table)))
            .query(&[("id", format!("eq.{}", id))])
            .json(changes);

        Self::check(self.authorized(request).send().await?).await?;
        Ok(())
    }

    /// DELETE /rest/v1/:table?id=eq.:id - remove one row by id.
    pub async fn delete(&self, table: &str, id: Uuid) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(self.endpoint(&format!("rest/v1/{}", table)))
            .query(&[("id", format!("eq.{}", id))]);

        Self::check(self.authorized(request).send().await?).await?;
        Ok(())
    }
}
