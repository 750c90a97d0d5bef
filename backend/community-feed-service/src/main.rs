use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use community_feed_service::repository::PgCounterStore;
use community_feed_service::services::CounterReconciler;
use community_feed_service::workers::counter_reconciler;
use community_feed_service::{handlers, AppState, Config};

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Local development convenience; absent in deployed environments
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(config.app.json_logs);

    info!("🔧 Starting community-feed-service");
    info!(
        "✅ Configuration loaded: env={}, http_port={}",
        config.app.env, config.app.http_port
    );

    // Initialize database pool with prepared statement caching disabled for PgBouncer compatibility
    let connect_options = PgConnectOptions::from_str(&config.database.url)
        .context("Failed to parse DATABASE_URL")?
        .statement_cache_capacity(0);

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;

    // Verify database connection
    sqlx::query("SELECT 1")
        .execute(&pg_pool)
        .await
        .context("Failed to verify database connection")?;
    info!("✅ Database pool created and verified");

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("✅ Database migrations completed");

    let app_state = AppState::with_postgres(pg_pool.clone(), config.feed);
    info!("✅ AppState created");

    let reconciler = Arc::new(CounterReconciler::new(
        Arc::new(PgCounterStore::new(pg_pool.clone())),
        config.reconciler.batch_size,
    ));

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("🚀 Starting HTTP server: http://{}", http_addr);

    let mut join_set = JoinSet::new();

    // Spawn HTTP server task
    let state_data = web::Data::new(app_state);
    let http_server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state_data.clone())
            .configure(handlers::configure)
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run();

    join_set.spawn(async move {
        http_server
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
    });
    info!("✅ HTTP server started");

    // Start like counter reconciliation
    let reconciler_config = config.reconciler.clone();
    join_set.spawn(async move {
        counter_reconciler::start_counter_reconciler(reconciler, reconciler_config).await;
        Ok(())
    });

    info!("🎉 community-feed-service is running");

    // Wait for any task to complete (or fail)
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => {
                info!("Task completed successfully");
            }
            Ok(Err(e)) => {
                tracing::error!("Task failed: {:#}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Task panicked: {:#}", e);
                return Err(anyhow::anyhow!("Task panicked: {}", e));
            }
        }
    }

    info!("🛑 community-feed-service shutting down");
    Ok(())
}
