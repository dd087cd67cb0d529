pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::NotificationDb;
pub use memory::{spawn_expiry_sweep, InMemoryNotificationStore};
pub use metrics::{
    get_metrics, init_metrics, record_notification_logged, record_notifications_listed,
};
pub use store::{NotificationStore, RECENT_LIMIT};
