use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a notification stays visible after `createdAt`.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(3600);

/// A logged notification as stored in the `notifications` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub event: String,
    pub message: String,
    #[serde(
        rename = "createdAt",
        with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build the record for a request that arrived at `received_at`.
    ///
    /// The identifier is assigned here, before the write, so the stored
    /// representation is known without reading the driver's insert result.
    pub fn new(event: String, message: String, received_at: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            event,
            message,
            created_at: ceil_to_millis(received_at),
        }
    }

    /// Instant after which the record must no longer be served.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at
            + ChronoDuration::from_std(RETENTION_WINDOW).unwrap_or(ChronoDuration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }
}

/// BSON dates keep milliseconds. Rounding up keeps `createdAt` no earlier
/// than the arrival instant and identical before and after a round trip.
fn ceil_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    let sub_millis = at.nanosecond() % 1_000_000;
    if sub_millis == 0 {
        return at;
    }
    match at.with_nanosecond(at.nanosecond() - sub_millis) {
        Some(floor) => floor + ChronoDuration::milliseconds(1),
        None => at,
    }
}
