use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::Notification;

/// Number of entries returned by the list-recent operation.
pub const RECENT_LIMIT: usize = 20;

/// Storage gateway used by the HTTP handlers.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist one notification and return what was stored.
    async fn insert(&self, notification: Notification) -> Result<Notification, AppError>;

    /// Newest-first, at most `limit` entries.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Notification>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
