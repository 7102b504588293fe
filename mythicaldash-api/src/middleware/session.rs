/// Session middleware
///
/// Routes behind [`require_session`] can extract the caller with
/// `Extension<User>`. Requests without a valid session are rejected with
/// `401 INVALID_SESSION` before the handler runs.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use mythicaldash_shared::{
    auth::session::{resolve_session, SessionError},
    error::StoreError,
    models::user::User,
};

/// Rejects requests without a valid session and stores the user in extensions
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_session(state.users.as_ref(), req.headers()).await?;

    tracing::debug!(user = %user.uuid, role = ?user.role(), "Session resolved");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Resolves the session if there is one
///
/// Missing, unknown and banned sessions all count as anonymous; only storage
/// failures are errors.
pub async fn optional_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, StoreError> {
    match resolve_session(state.users.as_ref(), headers).await {
        Ok(user) => Ok(Some(user)),
        Err(SessionError::Store(e)) => Err(e),
        Err(_) => Ok(None),
    }
}
