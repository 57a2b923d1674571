use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::notifications::models::{
    NewNotification, Notification, NotificationKind, NotificationStatus,
};

/// Request DTO for sending a notification to a user
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNotificationDto {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000, message = "body is required"))]
    pub body: String,
    /// Deliver later instead of now
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
}

impl CreateNotificationDto {
    pub fn into_new(self, sender_id: Uuid) -> NewNotification {
        NewNotification {
            recipient_id: self.recipient_id,
            sender_id: Some(sender_id),
            kind: self.kind,
            title: self.title,
            body: self.body,
            metadata: self.metadata.unwrap_or_else(|| serde_json::json!({})),
            scheduled_at: self.scheduled_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponseDto {
    pub id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub status: NotificationStatus,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponseDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            sender_id: n.sender_id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            status: n.status,
            metadata: n.metadata,
            scheduled_at: n.scheduled_at,
            sent_at: n.sent_at,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountDto {
    pub unread: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponseDto {
    pub updated: u64,
}
