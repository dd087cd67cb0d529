use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Notification;
use crate::services::{record_notification_logged, record_notifications_listed, RECENT_LIMIT};
use crate::startup::AppState;
use service_core::error::AppError;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Event and message are required";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save notification";
pub const LIST_FAILED_MESSAGE: &str = "Could not retrieve notifications";

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateNotificationRequest {
    #[validate(required, length(min = 1))]
    pub event: Option<String>,
    #[validate(required, length(min = 1))]
    pub message: Option<String>,
}

impl CreateNotificationRequest {
    /// `(event, message)` when both are present and non-empty.
    pub fn into_fields(self) -> Option<(String, String)> {
        self.validate().ok()?;
        Some((self.event?, self.message?))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub event: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_hex(),
            event: n.event,
            message: n.message,
            created_at: n.created_at,
        }
    }
}

#[tracing::instrument(skip(state, payload))]
pub async fn create_notification(
    State(state): State<AppState>,
    payload: Result<Json<CreateNotificationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NotificationResponse>), AppError> {
    let received_at = Utc::now();

    // Readiness is checked before the body is looked at.
    let store = state.store()?;

    // A missing, non-JSON or mistyped body counts as missing fields. Other
    // rejections (e.g. an oversized body) keep their own status.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_),
        ) => CreateNotificationRequest::default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected notification body");
            record_notification_logged("rejected");
            return Err(rejection.into());
        }
    };
    let Some((event, message)) = request.into_fields() else {
        record_notification_logged("invalid");
        return Err(AppError::BadRequest(anyhow::anyhow!(REQUIRED_FIELDS_MESSAGE)));
    };

    let stored = store
        .insert(Notification::new(event, message, received_at))
        .await
        .map_err(|e| {
            record_notification_logged("error");
            AppError::storage(SAVE_FAILED_MESSAGE, e)
        })?;

    record_notification_logged("stored");
    tracing::info!(
        id = %stored.id,
        event = %stored.event,
        "Notification logged: {}",
        stored.message
    );

    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[tracing::instrument(skip(state))]
pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let store = state.store()?;

    let notifications = store.list_recent(RECENT_LIMIT).await.map_err(|e| {
        record_notifications_listed("error");
        AppError::storage(LIST_FAILED_MESSAGE, e)
    })?;

    record_notifications_listed("ok");
    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}
