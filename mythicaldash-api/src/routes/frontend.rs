/// Guarded single-page app entry routes
///
/// The dashboard frontend is a client-side router, but its entry points are
/// guarded here so a browser never sees a page it can't use. Each guarded
/// path runs through [`navigation::resolve`]; everything else falls through
/// to the built assets, with `index.html` for unknown paths.
///
/// The "return here after login" path travels in the `redirect_after_login`
/// cookie, percent-encoded.

use crate::{app::AppState, error::ApiError, middleware::session::optional_user, response::found};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use mythicaldash_shared::{
    auth::session::cookie_value,
    navigation::{self, Decision, Visitor, REDIRECT_COOKIE, ROUTES},
};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Lifetime of the remembered path, in seconds
const REDIRECT_COOKIE_MAX_AGE: u32 = 600;

/// Router for the guarded entry paths plus static assets
pub fn router(dist: &Path) -> Router<AppState> {
    let mut router = Router::new();

    for (pattern, _) in ROUTES {
        match pattern.strip_suffix("/*") {
            Some(prefix) => {
                router = router
                    .route(prefix, get(spa_entry))
                    .route(&format!("{}/*rest", prefix), get(spa_entry));
            }
            None => {
                router = router.route(pattern, get(spa_entry));
            }
        }
    }

    let assets = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));

    router.fallback_service(assets)
}

/// Unknown `/api/...` paths answer with the JSON envelope, not `index.html`
pub async fn api_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn decode_cookie(raw: &str) -> Option<String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .filter(|path| !path.is_empty())
}

fn redirect_cookie(value: Option<&str>) -> Option<HeaderValue> {
    let cookie = match value {
        Some(path) => {
            let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
            format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
                REDIRECT_COOKIE, encoded, REDIRECT_COOKIE_MAX_AGE
            )
        }
        None => format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", REDIRECT_COOKIE),
    };

    HeaderValue::from_str(&cookie).ok()
}

async fn index_page(dist: &Path) -> Response {
    match tokio::fs::read_to_string(dist.join("index.html")).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(dist = %dist.display(), error = %e, "Frontend index.html missing");
            (StatusCode::NOT_FOUND, Html("<h1>Frontend not built</h1>".to_string())).into_response()
        }
    }
}

/// Serves `index.html` or redirects, per the route guard
pub async fn spa_entry(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let user = match optional_user(&state, &headers).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "Session lookup failed on page load");
            None
        }
    };

    let visitor = Visitor::from_user(user.as_ref());
    let stored = cookie_value(&headers, REDIRECT_COOKIE).and_then(decode_cookie);

    let nav = navigation::resolve(uri.path(), visitor, stored.as_deref());

    let mut response = match &nav.decision {
        Decision::Allow => index_page(&state.config.frontend.dist_dir).await,
        Decision::Redirect(to) => {
            tracing::debug!(from = uri.path(), to = %to, visitor = ?visitor, "Route guard redirect");
            found(to)
        }
    };

    let cookie = if let Some(path) = nav.store_redirect.as_deref() {
        redirect_cookie(Some(path))
    } else if nav.clear_redirect {
        redirect_cookie(None)
    } else {
        None
    };

    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    response
}
