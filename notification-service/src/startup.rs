//! Application startup and lifecycle management.
//!
//! The HTTP listener comes up first. The storage gateway connects while
//! requests are already being answered; until it is ready the notification
//! routes respond 503. A failed connect ends `run_until_stopped` with an
//! error so the process exits.

use crate::config::{NotificationConfig, StoreBackend};
use crate::handlers;
use crate::services::{
    spawn_expiry_sweep, InMemoryNotificationStore, NotificationDb, NotificationStore,
};
use axum::{middleware::from_fn, routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::OnceCell;
use tower_http::trace::TraceLayer;

pub const NOT_READY_MESSAGE: &str = "Service not ready, DB not connected";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NotificationConfig>,
    store: Arc<OnceCell<Arc<dyn NotificationStore>>>,
}

impl AppState {
    /// State whose storage gateway has not connected yet.
    pub fn pending(config: NotificationConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(OnceCell::new()),
        }
    }

    /// State with a gateway that is already usable.
    pub fn ready(config: NotificationConfig, store: Arc<dyn NotificationStore>) -> Self {
        let state = Self::pending(config);
        state.mark_ready(store);
        state
    }

    /// Publish the connected gateway. Only the first call has an effect.
    pub fn mark_ready(&self, store: Arc<dyn NotificationStore>) {
        if self.store.set(store).is_err() {
            tracing::warn!("Storage gateway already set; ignoring");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.store.initialized()
    }

    /// The connected gateway, or the 503 the handlers return before connect.
    pub fn store(&self) -> Result<Arc<dyn NotificationStore>, AppError> {
        self.store
            .get()
            .cloned()
            .ok_or_else(|| AppError::ServiceUnavailable(NOT_READY_MESSAGE.to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}

/// Connect the configured backend and prepare it for traffic.
pub async fn connect_store(
    config: &NotificationConfig,
) -> Result<Arc<dyn NotificationStore>, AppError> {
    match config.store {
        StoreBackend::Mongodb => {
            tracing::info!(
                uri = %config.mongodb.redacted_connection_string(),
                database = %config.mongodb.database,
                "Using MongoDB storage gateway"
            );
            let db = NotificationDb::connect(
                &config.mongodb.connection_string(),
                &config.mongodb.database,
                config.mongodb.connect_timeout(),
            )
            .await?;
            db.initialize_indexes().await?;
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory storage gateway; notifications are not persisted");
            let store = Arc::new(InMemoryNotificationStore::new());
            spawn_expiry_sweep(store.clone(), config.expiry_sweep_interval());
            Ok(store)
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Bind the listener. Does not touch the store.
    pub async fn build(config: NotificationConfig) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Notification service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState::pending(config),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, connecting the store in parallel.
    /// A connect failure stops the server and is returned as the error.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let state = self.state.clone();
        let router = build_router(self.state);
        let server = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .into_future();

        let connect = async {
            let store = connect_store(&state.config).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to connect storage gateway");
                std::io::Error::other(format!("Database connection error: {}", e))
            })?;
            state.mark_ready(store);
            tracing::info!("Storage gateway ready; accepting notifications");
            Ok::<(), std::io::Error>(())
        };

        tokio::pin!(server);
        tokio::select! {
            result = &mut server => {
                return result.map_err(|e| {
                    tracing::error!("HTTP server error: {}", e);
                    std::io::Error::other(format!("HTTP server error: {}", e))
                });
            }
            result = connect => result?,
        }

        server.await.map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
