use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use crate::state::AppState;
use crate::store::SessionUser;

/// Routes that render without a session. Everything else redirects to the
/// sign-in page while signed out.
pub const PUBLIC_ROUTES: &[&str] = &["/", "/health", "/login", "/signup", "/forgot-password"];

/// Authenticated user context injected into protected requests.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl From<SessionUser> for AuthUser {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Session guard, consulted on every navigation. An absent session on a
/// non-public route is not an error; it is a silent redirect to sign-in.
pub async fn session_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = state.session.current() {
        request.extensions_mut().insert(AuthUser::from(user));
        return next.run(request).await;
    }

    if PUBLIC_ROUTES.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    Redirect::to("/login").into_response()
}
