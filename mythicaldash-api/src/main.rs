//! # MythicalDash API Server
//!
//! Serves the dashboard's JSON API and its single-page frontend.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/mythicaldash cargo run -p mythicaldash-api
//! STORAGE=memory cargo run -p mythicaldash-api
//! ```

use mythicaldash_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use mythicaldash_shared::db::{
    memory::MemoryStore,
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mythicaldash_api=debug,mythicaldash_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "MythicalDash API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let (state, pool) = match config.database.backend {
        StorageBackend::Postgres => {
            let pool = create_pool(DatabaseConfig::from_url(
                &config.database.url,
                config.database.max_connections,
            ))
            .await?;
            run_migrations(&pool).await?;
            (AppState::postgres(pool.clone(), config), Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            (AppState::in_memory(Arc::new(MemoryStore::new()), config), None)
        }
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
