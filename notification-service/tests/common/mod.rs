#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use notification_service::config::{MongoConfig, NotificationConfig, StoreBackend};
use notification_service::models::Notification;
use notification_service::services::{InMemoryNotificationStore, NotificationStore};
use notification_service::startup::{build_router, AppState};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::sync::Arc;
use tower::util::ServiceExt;

pub fn test_config(store: StoreBackend) -> NotificationConfig {
    NotificationConfig {
        common: CoreConfig {
            port: 0,
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
        store,
        mongodb: MongoConfig {
            uri: Some(
                std::env::var("TEST_MONGODB_URI")
                    .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            ),
            username: String::new(),
            password: Secret::new(String::new()),
            host: "localhost".to_string(),
            port: 27017,
            database: format!("notification_test_{}", uuid::Uuid::new_v4().simple()),
            connect_timeout_secs: 5,
        },
        expiry_sweep_interval_secs: 60,
    }
}

/// Router over an in-process app whose gateway is connected.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryNotificationStore>,
}

impl TestApp {
    pub fn ready() -> Self {
        let store = Arc::new(InMemoryNotificationStore::new());
        let state = AppState::ready(test_config(StoreBackend::Memory), store.clone());
        Self {
            router: build_router(state),
            store,
        }
    }

    pub async fn post_notification(&self, body: &str) -> (StatusCode, serde_json::Value) {
        send(&self.router, post_json("/notifications", body)).await
    }

    pub async fn list_notifications(&self) -> (StatusCode, serde_json::Value) {
        send(&self.router, get("/notifications")).await
    }
}

/// Router whose gateway never connected.
pub fn pending_router() -> Router {
    build_router(AppState::pending(test_config(StoreBackend::Memory)))
}

/// Router whose gateway fails every call.
pub fn failing_router() -> Router {
    build_router(AppState::ready(
        test_config(StoreBackend::Memory),
        Arc::new(FailingStore),
    ))
}

pub struct FailingStore;

#[async_trait]
impl NotificationStore for FailingStore {
    async fn insert(&self, _notification: Notification) -> Result<Notification, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("write concern error")))
    }

    async fn list_recent(&self, _limit: usize) -> Result<Vec<Notification>, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("cursor killed")))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("ping failed")))
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request and decode the body as JSON (`Null` when empty or not JSON).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}
