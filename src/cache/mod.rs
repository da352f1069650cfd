use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

/// Client-side query cache keyed by (entity, optional filter value).
///
/// Reads consult the cache first; every successful mutation invalidates all
/// cached queries for the touched entity, so the next read re-queries the
/// store. The store itself stays the single source of truth.
pub struct QueryCache {
    enabled: bool,
    entries: RwLock<HashMap<(String, Option<String>), Value>>,
}

impl QueryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, entity: &str, filter: Option<&str>) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        let key = (entity.to_string(), filter.map(str::to_string));
        self.entries.read().unwrap().get(&key).cloned()
    }

    pub fn put(&self, entity: &str, filter: Option<&str>, rows: &[Value]) {
        if !self.enabled {
            return;
        }
        let key = (entity.to_string(), filter.map(str::to_string));
        self.entries.write().unwrap().insert(key, Value::Array(rows.to_vec()));
    }

    /// Drop every cached query for the entity, whatever its filter.
    pub fn invalidate(&self, entity: &str) {
        self.entries.write().unwrap().retain(|(cached, _), _| cached != entity);
    }
}
