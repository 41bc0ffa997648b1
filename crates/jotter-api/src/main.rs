mod accounts;
mod auth;
mod config;
mod error;
mod extract;
mod notes;
mod rate_limit;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use jotter_core::db::Database;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jotter_api=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting jotter-api with config: {:?}", config);

    let db = Database::open(&config.database_path).await?;
    db.ping().await?;
    tracing::info!(path = %config.database_path, "Database ready");

    let state = AppState::new(config, Arc::new(db));
    let bind_addr = state.config.bind_addr.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("jotter-api listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
