// User profile rows. These are ordinary table rows, distinct from the auth
// identities the store manages: the profile row maps a session's email to
// the internal owner id referenced by projects.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::store::{SelectQuery, StoreClient, StoreError};

pub const TABLE: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct NewUserRecord {
    pub email: String,
}

/// Fetch the single profile row for an email address.
pub async fn fetch_by_email(
    store: &StoreClient,
    cache: &QueryCache,
    email: &str,
) -> Result<UserRecord, StoreError> {
    let rows = match cache.get(TABLE, Some(email)) {
        Some(rows) => rows,
        None => {
            let rows = store
                .select(TABLE, SelectQuery::all().eq("email", email))
                .await?;
            cache.put(TABLE, Some(email), &rows);
            Value::Array(rows)
        }
    };

    let records: Vec<UserRecord> =
        serde_json::from_value(rows).map_err(|e| StoreError::UnexpectedBody(e.to_string()))?;

    // Mirrors the store's single-row read: zero rows is a rejection, not an
    // empty result.
    match records.into_iter().next() {
        Some(record) => Ok(record),
        None => Err(StoreError::Rejected {
            status: 406,
            message: format!("no user record for {}", email),
        }),
    }
}

pub async fn insert(
    store: &StoreClient,
    cache: &QueryCache,
    records: Vec<NewUserRecord>,
) -> Result<Vec<Value>, StoreError> {
    let body =
        serde_json::to_value(&records).map_err(|e| StoreError::UnexpectedBody(e.to_string()))?;
    let inserted = store.insert(TABLE, &body).await?;
    cache.invalidate(TABLE);
    Ok(inserted)
}
