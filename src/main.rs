use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use restaurant_crm_analytics::{
    analytics::PgEventRepository, config::AppConfig, create_router, db, insights::PgInsightRepository,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Restaurant CRM Analytics - Starting...");

    let config = AppConfig::from_env().context("invalid configuration")?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("failed to connect to Postgres")?;

    db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let state = AppState::new(
        Arc::new(PgEventRepository::new(pool.clone())),
        Arc::new(PgInsightRepository::new(pool)),
        config.analytics.clone(),
    );
    let metrics = state.metrics.clone();
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Restaurant CRM Analytics is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    metrics.log_summary();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
