use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{StoreClient, StoreError};

/// Identity attached to a session, as reported by the store's auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: SessionUser,
}

/// Session-change notification, fired on sign-in, sign-out and token refresh.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

fn parse_session(body: Value) -> Result<Session, StoreError> {
    serde_json::from_value(body).map_err(|e| StoreError::UnexpectedBody(e.to_string()))
}

impl StoreClient {
    /// POST /auth/v1/token?grant_type=password - sign in with email/password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, StoreError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        let session = parse_session(response.json().await?)?;

        self.set_token(Some(session.access_token.clone()));
        self.notify(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// POST /auth/v1/signup - register with email/password. Returns the new
    /// session when the store issues one immediately; `None` when it defers
    /// to e-mail confirmation.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, StoreError> {
        let response = self
            .http
            .post(self.endpoint("auth/v1/signup"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        let body: Value = response.json().await?;

        if body.get("access_token").is_none() {
            return Ok(None);
        }

        let session = parse_session(body)?;
        self.set_token(Some(session.access_token.clone()));
        self.notify(SessionEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    /// POST /auth/v1/logout - close the session. Local session state is
    /// cleared and the sign-out notification fired even when the remote call
    /// fails; the caller decides whether the failure matters.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        let token = self.token();
        self.set_token(None);
        self.notify(SessionEvent::SignedOut);

        if let Some(token) = token {
            let response = self
                .http
                .post(self.endpoint("auth/v1/logout"))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await?;
            Self::check(response).await?;
        }

        Ok(())
    }

    /// GET /auth/v1/user - resolve the held access token back to a session.
    /// An expired or revoked token reads as "no session", not as an error.
    pub async fn get_session(&self) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.token() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.endpoint("auth/v1/user"))
            .header("apikey", &self.api_key)
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            self.set_token(None);
            return Ok(None);
        }

        let response = Self::check(response).await?;
        let user: SessionUser = serde_json::from_value(response.json().await?)
            .map_err(|e| StoreError::UnexpectedBody(e.to_string()))?;

        Ok(Some(Session {
            access_token: token,
            expires_at: None,
            user,
        }))
    }
}
