use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Delivery channel, matching the database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Email,
    /// In-app only
    System,
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Read,
}

/// Database model for a notification
#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub status: NotificationStatus,
    pub metadata: serde_json::Value,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Email notifications without a schedule go out as soon as they are created
    pub fn wants_immediate_delivery(&self) -> bool {
        self.kind == NotificationKind::Email && self.scheduled_at.is_none()
    }
}

/// Data for creating a notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub metadata: serde_json::Value,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NewNotification {
    /// A system notification from the service itself
    pub fn system(recipient_id: Uuid, title: String, body: String) -> Self {
        Self {
            recipient_id,
            sender_id: None,
            kind: NotificationKind::System,
            title,
            body,
            metadata: serde_json::json!({}),
            scheduled_at: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
