pub mod notification;

pub use notification::{Notification, RETENTION_WINDOW};
