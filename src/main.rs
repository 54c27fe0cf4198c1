//! Agora identity service.
//!
//! Main entry point that wires the crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use agora_api::AppState;
use agora_auth::session::SessionSweeper;
use agora_core::config::AppConfig;
use agora_core::error::AppError;
use agora_database::repositories::SessionRepository;
use agora_service::identity::TracingDelivery;

#[tokio::main]
async fn main() {
    let env = std::env::var("AGORA_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        "Starting Agora identity service v{}",
        env!("CARGO_PKG_VERSION")
    );

    // ── Database connection + migrations ─────────────────────────
    let db = agora_database::DatabasePool::connect(&config.database).await?;
    agora_database::migration::run_migrations(db.pool()).await?;
    let db_pool = db.into_pool();

    // ── Background sweep ─────────────────────────────────────────
    let sweeper = SessionSweeper::new(Arc::new(SessionRepository::new(db_pool.clone())));
    let sweep_interval = config.session.sweep_interval_minutes;
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(sweep_interval * 60));
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.run_sweep().await {
                tracing::error!("Session sweep failed: {e}");
            }
        }
    });

    // ── HTTP server ──────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::build(config, db_pool, Arc::new(TracingDelivery));
    let router = agora_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
