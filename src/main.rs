use std::sync::Arc;

use tracing::info;

use traffic_sentinel::audit::{AuditSink, JsonlAuditLog, MemoryAuditLog};
use traffic_sentinel::config::ServerConfig;
use traffic_sentinel::signal::ThreadRngJitter;
use traffic_sentinel::status::StatusStore;
use traffic_sentinel::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration and logging
    let config = ServerConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(true)
        .init();
    let addr = config.socket_addr()?;

    // 2. Audit trail
    let audit: Arc<dyn AuditSink> = match &config.audit_log_path {
        Some(path) => {
            info!(path = %path.display(), "appending prediction audit records to file");
            Arc::new(JsonlAuditLog::new(path.clone()))
        }
        None => {
            info!("keeping prediction audit records in memory");
            Arc::new(MemoryAuditLog::new())
        }
    };

    // 3. Status checks
    let status = match &config.status_log_path {
        Some(path) => StatusStore::open(path.clone()).await?,
        None => StatusStore::new(),
    };

    // 4. Router
    let state = AppState::new(Arc::new(ThreadRngJitter), audit).with_status_store(status);
    let app = create_router(state, &config.cors_origins);

    info!("Traffic Sentinel API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
