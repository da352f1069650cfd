// Remote store client. Everything this application persists - rows and
// identities alike - lives behind the hosted store's HTTP interface; this
// module is the only place that talks to it.
mod auth;
mod rest;

pub use auth::{Session, SessionEvent, SessionUser};
pub use rest::SelectQuery;

use std::sync::RwLock;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use url::Url;

use crate::config::StoreConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success response from the store, carrying its own message.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unexpected store response: {0}")]
    UnexpectedBody(String),
}

pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    access_token: RwLock<Option<String>>,
    session_events: broadcast::Sender<SessionEvent>,
}

impl StoreClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
            access_token: RwLock::new(None),
            session_events: broadcast::channel(16).0,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            api_key: config.api_key.clone(),
            access_token: RwLock::new(config.access_token.clone()),
            session_events: broadcast::channel(16).0,
        })
    }

    /// Subscribe to session-change notifications. Fired on sign-in, sign-out
    /// and token refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_events.subscribe()
    }

    /// GET /auth/v1/health - store reachability probe
    pub async fn health(&self) -> Result<(), StoreError> {
        let response = self
            .http
            .get(self.endpoint("auth/v1/health"))
            .header("apikey", &self.api_key)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn token(&self) -> Option<String> {
        self.access_token.read().unwrap().clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.access_token.write().unwrap() = token;
    }

    /// Attach the `apikey` header plus a bearer token: the session's access
    /// token when one is held, the project key otherwise.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.token().unwrap_or_else(|| self.api_key.clone());
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    fn notify(&self, event: SessionEvent) {
        // Nobody listening is fine; notifications are best-effort.
        let _ = self.session_events.send(event);
    }

    /// Map a non-success response to `StoreError::Rejected`, pulling the
    /// message out of whichever field this store family uses.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| body.get("error_description").and_then(Value::as_str))
            .or_else(|| body.get("msg").and_then(Value::as_str))
            .or_else(|| body.get("error").and_then(Value::as_str))
            .unwrap_or("store request rejected")
            .to_string();

        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
