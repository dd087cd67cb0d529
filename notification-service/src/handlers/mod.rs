//! HTTP handlers for notification-service.

pub mod health;
pub mod metrics;
pub mod notifications;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_endpoint;
pub use notifications::{create_notification, list_notifications};
