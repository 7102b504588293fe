/// Session resolution from request cookies
///
/// The dashboard authenticates browsers with an opaque `user_token` cookie
/// issued by the login flow. This module only reads the cookie and resolves it
/// to a user; issuing and revoking tokens belongs to the auth service.

use axum::http::{header, HeaderMap};

use crate::error::StoreError;
use crate::models::user::{User, UserStore};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "user_token";

/// Error type for session resolution
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session cookie on the request
    #[error("Missing session cookie")]
    MissingToken,

    /// Cookie present but no user owns the token
    #[error("Session token is not valid")]
    InvalidToken,

    /// The user behind the token is banned
    #[error("Account is banned")]
    Banned,

    /// Lookup failed
    #[error("Session lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Reads a cookie value from the `Cookie` headers
///
/// Returns `None` for missing or empty cookies.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Resolves the session user for a request
pub async fn resolve_session(
    users: &dyn UserStore,
    headers: &HeaderMap,
) -> Result<User, SessionError> {
    let token = cookie_value(headers, SESSION_COOKIE).ok_or(SessionError::MissingToken)?;

    let user = users
        .find_by_token(token)
        .await?
        .ok_or(SessionError::InvalidToken)?;

    if user.banned {
        return Err(SessionError::Banned);
    }

    Ok(user)
}
