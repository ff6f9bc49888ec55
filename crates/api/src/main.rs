use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use hearth_intake::{IntakeOrchestrator, Stores};
use hearth_storage::{LocalObjectStore, ObjectStore, S3ObjectStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth_api::config::{ConfigError, LogFormat, ServerConfig, StorageBackend};
use hearth_api::router::build_app_router;
use hearth_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;

    // --- Tracing ---
    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hearth_api=debug,hearth_intake=debug,tower_http=debug".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

    let pool = hearth_db::create_pool(&database_url).await?;
    tracing::info!("Database connection pool created");

    hearth_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    hearth_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- Object store ---
    let objects: Arc<dyn ObjectStore> = match &config.storage {
        StorageBackend::Local { root } => {
            tokio::fs::create_dir_all(root).await?;
            tracing::info!(root = %root.display(), "Using local document storage");
            Arc::new(LocalObjectStore::new(root.clone()))
        }
        StorageBackend::S3 { bucket } => {
            tracing::info!(%bucket, "Using S3 document storage");
            Arc::new(S3ObjectStore::from_env(bucket.clone()).await)
        }
    };

    // --- App state ---
    let intake = IntakeOrchestrator::new(Stores::postgres(pool.clone(), objects));
    let state = AppState {
        pool: Some(pool),
        config: Arc::new(config.clone()),
        intake,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = config.host.parse().map_err(|e| ConfigError::Invalid {
        var: "HOST",
        value: config.host.clone(),
        reason: format!("{e}"),
    })?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
