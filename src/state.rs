use std::sync::Arc;

use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::session::SessionContext;
use crate::store::{StoreClient, StoreError};

/// Shared application state: the store client, the query cache and the
/// session context, each constructed once and injected everywhere.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StoreClient>,
    pub cache: Arc<QueryCache>,
    pub session: Arc<SessionContext>,
}

impl AppState {
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store = Arc::new(StoreClient::from_config(&config.store)?);
        let cache = Arc::new(QueryCache::new(config.cache.enable_query_cache));
        let session = SessionContext::attach(Arc::clone(&store)).await;

        Ok(Self {
            store,
            cache,
            session,
        })
    }
}
