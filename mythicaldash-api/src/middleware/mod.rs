/// Middleware and extractors for the API server
///
/// - `session`: Resolves the `user_token` cookie to a user
/// - `client_ip`: Real client address behind Cloudflare and proxies

pub mod client_ip;
pub mod session;
