//! Process-local storage gateway.
//!
//! Has no native TTL, so expiry is a periodic sweep: a record may outlive
//! its retention window by up to one sweep interval, the same eventual
//! guarantee MongoDB's TTL monitor gives.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::models::Notification;
use crate::services::store::NotificationStore;

#[derive(Default)]
pub struct InMemoryNotificationStore {
    // Insertion order.
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notifications.read().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record whose retention window has passed at `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut notifications = self.notifications.write().map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("In-memory store lock poisoned: {}", e))
        })?;
        let before = notifications.len();
        notifications.retain(|n| !n.is_expired(now));
        Ok(before - notifications.len())
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<Notification, AppError> {
        self.notifications
            .write()
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("In-memory store lock poisoned: {}", e))
            })?
            .push(notification.clone());
        Ok(notification)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Notification>, AppError> {
        let notifications = self.notifications.read().map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("In-memory store lock poisoned: {}", e))
        })?;

        // Reverse first so the stable sort puts the later insert ahead on ties.
        let mut recent: Vec<Notification> = notifications.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Run [`InMemoryNotificationStore::purge_expired`] every `interval`.
pub fn spawn_expiry_sweep(
    store: Arc<InMemoryNotificationStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()) {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Expired notifications purged"),
                Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}
