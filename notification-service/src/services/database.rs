use crate::models::{Notification, RETENTION_WINDOW};
use crate::services::store::NotificationStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{ClientOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::time::Duration;

const COLLECTION: &str = "notifications";

/// TTL index on `createdAt`. Left unnamed so the server default
/// (`createdAt_1`) matches an equivalent index created by other clients.
pub fn retention_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "createdAt": 1 })
        .options(
            IndexOptions::builder()
                .expire_after(RETENTION_WINDOW)
                .build(),
        )
        .build()
}

/// Newest first; `_id` breaks ties between equal timestamps.
pub fn recent_find_options(limit: usize) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "createdAt": -1, "_id": -1 })
        .limit(i64::try_from(limit).unwrap_or(i64::MAX))
        .build()
}

#[derive(Clone)]
pub struct NotificationDb {
    client: MongoClient,
    db: Database,
}

impl NotificationDb {
    /// Connect and verify the server answers. The driver connects lazily, so
    /// the ping is what surfaces an unreachable server at startup.
    pub async fn connect(
        uri: &str,
        database: &str,
        connect_timeout: Duration,
    ) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Invalid MongoDB connection string: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        options.app_name = Some("notification-service".to_string());
        options.server_selection_timeout = Some(connect_timeout);
        options.connect_timeout = Some(connect_timeout);

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        let gateway = Self { client, db };

        gateway.health_check().await?;
        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(gateway)
    }

    /// Ensure the TTL index on `createdAt` exists. Idempotent; fails if a
    /// `createdAt_1` index with a different expiry is already present.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        self.notifications()
            .create_index(retention_index(), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create createdAt TTL index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!(
            expire_after_secs = RETENTION_WINDOW.as_secs(),
            "Retention index ready"
        );
        Ok(())
    }

    pub fn notifications(&self) -> Collection<Notification> {
        self.db.collection(COLLECTION)
    }
}

#[async_trait]
impl NotificationStore for NotificationDb {
    async fn insert(&self, notification: Notification) -> Result<Notification, AppError> {
        self.notifications()
            .insert_one(&notification, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert notification: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(notification)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Notification>, AppError> {
        let cursor = self
            .notifications()
            .find(doc! {}, recent_find_options(limit))
            .await
            .map_err(|e| {
                tracing::error!("Failed to list notifications: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect notifications: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_index_expires_created_at_after_an_hour() {
        let index = retention_index();
        assert_eq!(index.keys, doc! { "createdAt": 1 });

        let options = index.options.expect("index options");
        assert_eq!(options.expire_after, Some(Duration::from_secs(3600)));
        assert_eq!(options.name, None);
        assert_eq!(options.unique, None);
    }

    #[test]
    fn recent_find_sorts_newest_first_with_limit() {
        let options = recent_find_options(20);
        assert_eq!(options.sort, Some(doc! { "createdAt": -1, "_id": -1 }));
        assert_eq!(options.limit, Some(20));
    }

    #[test]
    fn recent_find_sort_key_order() {
        let sort = recent_find_options(1).sort.expect("sort");
        let keys: Vec<&str> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["createdAt", "_id"]);
    }
}
