use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::notifications::models::{NewNotification, Notification};

/// Port for notification persistence
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a new notification with status `pending`
    async fn insert(&self, data: &NewNotification) -> Result<Notification>;

    async fn find_by_id(&self, notification_id: Uuid) -> Result<Option<Notification>>;

    /// Mark a `pending` notification sent. `None` when the row is gone or
    /// no longer pending.
    async fn mark_sent(
        &self,
        notification_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<Notification>>;

    /// Mark a `pending` notification failed and record `reason` under
    /// `metadata.delivery_error`. `None` when the row is gone or no longer
    /// pending.
    async fn mark_failed(
        &self,
        notification_id: Uuid,
        reason: &str,
    ) -> Result<Option<Notification>>;

    async fn mark_read(
        &self,
        notification_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>>;

    /// Mark every unread notification of a recipient read. Returns the count.
    async fn mark_all_read(&self, recipient_id: Uuid, read_at: DateTime<Utc>) -> Result<u64>;

    /// Pending notifications whose `scheduled_at` is at or before `now`
    async fn find_pending_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>>;

    /// Delete read notifications created before `cutoff`. Returns the count.
    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Newest first, with the total matching count
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)>;

    async fn count_unread(&self, recipient_id: Uuid) -> Result<i64>;
}
