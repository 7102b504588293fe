/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory application with seeded member and admin accounts
/// - Local stub servers standing in for PayPal and the license service
/// - Request helpers carrying the session cookie

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    routing::post,
    Router,
};
use mythicaldash_api::{
    app::{build_router, AppState, Stores},
    config::Config,
};
use mythicaldash_shared::{
    auth::authorization::Role,
    db::memory::MemoryStore,
    integrations::{license::LicenseChecker, IntegrationError, IntegrationResult},
    models::user::User,
};
use serde_json::{json, Value};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tower::ServiceExt;

pub const BUSINESS_EMAIL: &str = "shop@example.com";

/// License checker answering from a fixed table
pub struct StubLicense;

#[async_trait]
impl LicenseChecker for StubLicense {
    async fn check(&self, key: &str) -> IntegrationResult<Value> {
        match key {
            "VALID-KEY" => Ok(json!({ "key": key, "status": "active", "owner": "MythicalSystems" })),
            _ => Err(IntegrationError::Status {
                status: 404,
                body: "unknown license".to_string(),
            }),
        }
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub member: User,
    pub admin: User,
    pub dist: PathBuf,
}

/// Serves `router` on an ephemeral local port and returns its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

impl TestContext {
    /// Creates a context with PayPal enabled and IPNs always verified
    pub async fn new() -> Self {
        let verify = spawn_stub(Router::new().route("/cgi-bin/webscr", post(|| async { "VERIFIED" }))).await;
        Self::with_vars(&[
            ("PAYPAL_ENABLED", "true"),
            ("PAYPAL_VERIFY_URL", &format!("{}/cgi-bin/webscr", verify)),
        ])
        .await
    }

    /// Creates a context from extra environment variables on top of the memory backend
    pub async fn with_vars(vars: &[(&str, &str)]) -> Self {
        let dist = std::env::temp_dir().join(format!("mythicaldash-dist-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("index.html"), "<html><body>MythicalDash</body></html>").unwrap();

        let mut map: HashMap<String, String> = HashMap::from([
            ("STORAGE".to_string(), "memory".to_string()),
            ("APP_URL".to_string(), "https://dash.example.com".to_string()),
            ("PAYPAL_BUSINESS_EMAIL".to_string(), BUSINESS_EMAIL.to_string()),
            ("PAYPAL_CURRENCY".to_string(), "EUR".to_string()),
            ("PAYPAL_PRICE_PER_COIN".to_string(), "0.01".to_string()),
            ("FRONTEND_DIST".to_string(), dist.display().to_string()),
        ]);
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }
        let config = Config::from_lookup(|key| map.get(key).cloned()).unwrap();

        let store = Arc::new(MemoryStore::new());
        let mut member = User::new("member", Role::Default);
        member.coins = 120.0;
        let member = store.insert_user(member).await;
        let admin = store.insert_user(User::new("admin", Role::Admin)).await;

        let state = AppState::with_license(
            Stores::from_single(store.clone()),
            config,
            None,
            Arc::new(StubLicense),
        );

        TestContext {
            app: build_router(state),
            store,
            member,
            admin,
            dist,
        }
    }

    /// Sends a request and returns the raw response
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// GET with an optional session
    pub async fn get(&self, uri: &str, user: Option<&User>) -> Response<Body> {
        self.send(request("GET", uri, user, None)).await
    }

    /// Form POST with an optional session
    pub async fn post_form(&self, uri: &str, user: Option<&User>, form: &str) -> Response<Body> {
        self.send(request("POST", uri, user, Some(form))).await
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dist);
    }
}

/// Builds a request carrying `user`'s session cookie
pub fn request(method: &str, uri: &str, user: Option<&User>, form: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(user) = user {
        builder = builder.header(header::COOKIE, format!("user_token={}", user.token));
    }

    match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Reads a JSON body
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Reads a text body
pub async fn text_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// `Location` header of a redirect
pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

/// Every `Set-Cookie` header of a response
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
