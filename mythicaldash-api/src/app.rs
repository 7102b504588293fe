/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use mythicaldash_api::{app::{build_router, AppState}, config::Config};
/// use mythicaldash_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(&config.database.url, 10)).await?;
/// let app = build_router(AppState::postgres(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::session::require_session, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use mythicaldash_shared::{
    db::{memory::MemoryStore, PgStore},
    integrations::{
        captcha::TurnstileValidator,
        license::{LicenseChecker, LicenseClient},
        paypal::PayPalClient,
        pterodactyl::PterodactylApplicationClient,
    },
    models::{
        activity::ActivityStore, leaderboard::LeaderboardStore, payment::PaymentStore,
        setting::SettingsStore, user::UserStore,
    },
    services::{
        leaderboard::LeaderboardService,
        payments::PaymentService,
        settings::{LoggingObserver, SettingsService},
    },
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Store handles the application runs against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub activity: Arc<dyn ActivityStore>,
    pub leaderboard: Arc<dyn LeaderboardStore>,
    pub payments: Arc<dyn PaymentStore>,
}

impl Stores {
    /// Uses one value for every store trait
    pub fn from_single<T>(store: Arc<T>) -> Self
    where
        T: UserStore + SettingsStore + ActivityStore + LeaderboardStore + PaymentStore + 'static,
    {
        Self {
            users: store.clone(),
            settings: store.clone(),
            activity: store.clone(),
            leaderboard: store.clone(),
            payments: store,
        }
    }
}

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; everything
/// inside is behind `Arc` or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub settings: SettingsService,
    pub leaderboard: LeaderboardService,
    pub payments: PaymentService,
    pub license: Arc<dyn LicenseChecker>,
    pub panel: Option<PterodactylApplicationClient>,
    pub turnstile: TurnstileValidator,

    /// Present with the PostgreSQL backend, for health checks
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wires services and clients from stores and configuration
    pub fn new(stores: Stores, config: Config, db: Option<PgPool>) -> Self {
        let license = Arc::new(LicenseClient::new(config.license.clone()));
        Self::with_license(stores, config, db, license)
    }

    /// Like [`AppState::new`] with a custom license checker
    pub fn with_license(
        stores: Stores,
        config: Config,
        db: Option<PgPool>,
        license: Arc<dyn LicenseChecker>,
    ) -> Self {
        let settings = SettingsService::new(stores.settings.clone(), stores.activity.clone())
            .with_observer(Arc::new(LoggingObserver));

        Self {
            users: stores.users.clone(),
            settings,
            leaderboard: LeaderboardService::new(stores.settings.clone(), stores.leaderboard.clone()),
            payments: PaymentService::new(stores.payments.clone(), PayPalClient::new(config.paypal.clone())),
            license,
            panel: config.pterodactyl.clone().map(PterodactylApplicationClient::new),
            turnstile: TurnstileValidator::new(config.turnstile.clone()),
            config: Arc::new(config),
            db,
        }
    }

    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self::new(Stores::from_single(store), config, Some(pool))
    }

    /// State backed by process memory
    pub fn in_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self::new(Stores::from_single(store), config, None)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /api/
/// │   ├── GET  /user/session                      (session)
/// │   ├── GET  /user/leaderboard/:type            (session)
/// │   ├── POST /admin/settings/update             (session + ManageSettings)
/// │   ├── GET  /admin/settings/get                (session + AdminUiAccess)
/// │   ├── GET  /admin/pterodactyl/users/:id       (session + ViewPanelUsers)
/// │   ├── GET  /paypal/process?coins=             (session, redirects)
/// │   ├── GET  /paypal/finish
/// │   ├── POST /webhooks/paypal                   (PayPal IPN)
/// │   ├── GET  /system/license/:key/info
/// │   └── POST /system/turnstile/verify
/// └── SPA entry routes and static assets
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session resolution (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Routes that need a logged-in user
    let session_routes = Router::new()
        .route("/user/session", get(routes::user::session))
        .route("/user/leaderboard/:type", get(routes::leaderboard::leaderboard))
        .route("/admin/settings/update", post(routes::settings::update_setting))
        .route("/admin/settings/get", get(routes::settings::get_settings))
        .route("/admin/pterodactyl/users/:id", get(routes::pterodactyl::get_panel_user))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // Public or self-authenticating routes
    let public_routes = Router::new()
        .route("/paypal/process", get(routes::paypal::process))
        .route("/paypal/finish", get(routes::paypal::finish))
        .route("/webhooks/paypal", post(routes::webhooks::paypal_ipn))
        .route("/system/license/:key/info", get(routes::license::license_info))
        .route("/system/turnstile/verify", post(routes::captcha::verify));

    let api_routes = Router::new()
        .merge(session_routes)
        .merge(public_routes)
        .fallback(routes::frontend::api_not_found);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::COOKIE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .merge(routes::frontend::router(&state.config.frontend.dist_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
