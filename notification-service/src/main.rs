//! Notification Service entry point.

use notification_service::config::NotificationConfig;
use notification_service::services::init_metrics;
use notification_service::startup::Application;

use service_core::observability::{init_tracing, shutdown_tracing};
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = NotificationConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Initialize tracing
    init_tracing(
        "notification-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        otlp_endpoint = ?config.common.otlp_endpoint,
        "Starting notification-service"
    );

    // Initialize metrics
    init_metrics().map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize metrics");
        std::io::Error::other(format!("Metrics error: {}", e))
    })?;

    tracing::info!(
        http_port = %config.common.port,
        store = ?config.store,
        mongodb = %config.mongodb.redacted_connection_string(),
        database = %config.mongodb.database,
        "Configuration loaded"
    );

    // Build and run application
    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::other(format!("Application build error: {}", e))
    })?;

    let result = app.run_with_shutdown(shutdown_signal()).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Application error");
    }

    shutdown_tracing();
    tracing::info!("Service shutdown complete");
    result
}
