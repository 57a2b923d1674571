use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::{NewNotification, Notification, NotificationStatus};
use crate::features::notifications::repositories::NotificationRepository;

const NOTIFICATION_COLUMNS: &str = r#"
    id, recipient_id, sender_id, kind, title, body, status, metadata,
    scheduled_at, sent_at, read_at, created_at, updated_at
"#;

/// Postgres-backed notification store
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, data: &NewNotification) -> Result<Notification> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
                (recipient_id, sender_id, kind, title, body, status, metadata, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(data.recipient_id)
        .bind(data.sender_id)
        .bind(data.kind)
        .bind(&data.title)
        .bind(&data.body)
        .bind(NotificationStatus::Pending)
        .bind(&data.metadata)
        .bind(data.scheduled_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert notification: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_id(&self, notification_id: Uuid) -> Result<Option<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get notification {}: {:?}", notification_id, e);
            AppError::Database(e)
        })
    }

    async fn mark_sent(
        &self,
        notification_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET status = $2, sent_at = $3, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(NotificationStatus::Sent)
        .bind(sent_at)
        .bind(NotificationStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notification {} sent: {:?}", notification_id, e);
            AppError::Database(e)
        })
    }

    async fn mark_failed(
        &self,
        notification_id: Uuid,
        reason: &str,
    ) -> Result<Option<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET status = $2,
                metadata = metadata || jsonb_build_object('delivery_error', $3::TEXT),
                updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(NotificationStatus::Failed)
        .bind(reason)
        .bind(NotificationStatus::Pending)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notification {} failed: {:?}", notification_id, e);
            AppError::Database(e)
        })
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET status = $2, read_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification_id)
        .bind(NotificationStatus::Read)
        .bind(read_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notification {} read: {:?}", notification_id, e);
            AppError::Database(e)
        })
    }

    async fn mark_all_read(&self, recipient_id: Uuid, read_at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET status = $2, read_at = $3, updated_at = NOW()
            WHERE recipient_id = $1 AND status <> $2
            "#,
        )
        .bind(recipient_id)
        .bind(NotificationStatus::Read)
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notifications read for {}: {:?}", recipient_id, e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected())
    }

    async fn find_pending_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE status = $1 AND scheduled_at IS NOT NULL AND scheduled_at <= $2
            ORDER BY scheduled_at
            "#
        ))
        .bind(NotificationStatus::Pending)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load scheduled notifications: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn delete_read_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE status = $1 AND created_at < $2")
            .bind(NotificationStatus::Read)
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clean up notifications: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected())
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        let filter = if unread_only {
            "recipient_id = $1 AND status <> 'read'"
        } else {
            "recipient_id = $1"
        };

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications WHERE {filter}"))
                .bind(recipient_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count notifications: {:?}", e);
                    AppError::Database(e)
                })?;

        let items = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE {filter}
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list notifications for {}: {:?}", recipient_id, e);
            AppError::Database(e)
        })?;

        Ok((items, total))
    }

    async fn count_unread(&self, recipient_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND status <> $2")
            .bind(recipient_id)
            .bind(NotificationStatus::Read)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count unread notifications: {:?}", e);
                AppError::Database(e)
            })
    }
}
