/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`authorization`]: Roles, capabilities and the `has_capability` check
/// - [`session`]: Resolving the `user_token` cookie to a user
///
/// # Example
///
/// ```no_run
/// use mythicaldash_shared::auth::authorization::{require_capability, Capability};
/// use mythicaldash_shared::auth::session::resolve_session;
/// use mythicaldash_shared::models::user::UserStore;
/// use axum::http::HeaderMap;
///
/// # async fn example(users: &dyn UserStore, headers: &HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
/// let user = resolve_session(users, headers).await?;
/// require_capability(&user, Capability::AdminUiAccess)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod session;
