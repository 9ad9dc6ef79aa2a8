//! LockReap Server — scheduled reclamation of stale content locks
//!
//! Main entry point that wires all crates together and starts the scheduler.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use lockreap_core::config::AppConfig;
use lockreap_core::error::AppError;
use lockreap_database::DatabasePool;
use lockreap_database::repositories::{ClusterRepository, ContentVersionRepository};
use lockreap_entity::cluster::ClusterNode;
use lockreap_worker::elector::HeartbeatMembership;
use lockreap_worker::reclaim::ContentApi;
use lockreap_worker::scanner::StaleLockScanner;
use lockreap_worker::{ReclamationRun, RunConfig, UnlockScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LOCKREAP_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting LockReap v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    lockreap_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Cluster membership registration ──────────────────
    let node_id = config.cluster.node_id.unwrap_or_else(Uuid::new_v4);
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let cluster_repo = ClusterRepository::new(db.pool().clone());
    let now = Utc::now();
    cluster_repo
        .register(&ClusterNode {
            id: node_id,
            hostname: host,
            started_at: now,
            last_heartbeat: now,
        })
        .await?;

    // ── Step 3: Build the reclamation run ────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let content_repo = Arc::new(ContentVersionRepository::new(db.pool().clone()));
    let membership = HeartbeatMembership::new(cluster_repo.clone(), node_id, &config.cluster);

    let run = Arc::new(ReclamationRun::new(
        Arc::clone(&content_repo) as Arc<dyn StaleLockScanner>,
        Arc::clone(&content_repo) as Arc<dyn ContentApi>,
        Arc::new(membership),
        shutdown_rx,
        RunConfig::from(&config.unlock),
    ));

    // ── Step 4: Start the scheduler ──────────────────────────────
    let cluster_repo = Arc::new(cluster_repo);
    let mut scheduler = UnlockScheduler::new(
        run,
        Arc::clone(&cluster_repo),
        node_id,
        &config.unlock,
        &config.cluster,
    )
    .await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;
    tracing::info!("LockReap is running, press Ctrl+C to stop");

    // ── Step 5: Wait for shutdown ────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {}", e)))?;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }
    if let Err(e) = cluster_repo.deregister(node_id).await {
        tracing::warn!(error = %e, "Failed to deregister cluster node");
    }
    db.close().await;

    tracing::info!("LockReap stopped");
    Ok(())
}
