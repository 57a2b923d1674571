use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::models::{
    NewNotification, Notification, NotificationKind, NotificationStatus,
};
use crate::features::notifications::repositories::NotificationRepository;
use crate::features::users::UserDirectory;
use crate::modules::mail::{MailTransport, OutgoingMail};

/// Creates, delivers and expires notifications
pub struct NotificationCenter {
    repository: Arc<dyn NotificationRepository>,
    directory: Arc<dyn UserDirectory>,
    mail: Arc<dyn MailTransport>,
}

impl NotificationCenter {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        directory: Arc<dyn UserDirectory>,
        mail: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            repository,
            directory,
            mail,
        }
    }

    /// Persist a notification as `pending`.
    ///
    /// Unscheduled email is delivered before returning; the returned value
    /// reflects the outcome. Delivery problems never fail the call.
    pub async fn create(&self, data: NewNotification) -> Result<Notification> {
        if data.recipient_id.is_nil() {
            return Err(AppError::Validation("recipient_id is required".to_string()));
        }
        if data.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if data.body.trim().is_empty() {
            return Err(AppError::Validation("body is required".to_string()));
        }

        let created = self.repository.insert(&data).await?;
        tracing::debug!(
            "Notification created: id={}, recipient={}, kind={:?}",
            created.id,
            created.recipient_id,
            created.kind
        );

        if created.wants_immediate_delivery() {
            return self.deliver(&created).await;
        }

        Ok(created)
    }

    /// Attempt delivery and record the outcome on the row.
    ///
    /// Only `pending` notifications are delivered. A row that was read or
    /// delivered in the meantime is returned as stored, without sending.
    /// Transport failures end as status `failed` with the reason in
    /// `metadata.delivery_error`; only persistence errors are returned.
    pub async fn deliver(&self, notification: &Notification) -> Result<Notification> {
        let current = self.stored(notification.id).await?;
        if current.status != NotificationStatus::Pending {
            tracing::debug!(
                "Notification {} is {:?}, skipping delivery",
                current.id,
                current.status
            );
            return Ok(current);
        }

        let outcome = match current.kind {
            NotificationKind::System => Ok(()),
            NotificationKind::Sms => Err("SMS delivery is not supported".to_string()),
            NotificationKind::Email => self.send_email(&current).await,
        };

        let recorded = match outcome {
            Ok(()) => {
                tracing::info!("Notification {} delivered ({:?})", current.id, current.kind);
                self.repository.mark_sent(current.id, Utc::now()).await?
            }
            Err(reason) => {
                tracing::warn!("Notification {} delivery failed: {}", current.id, reason);
                self.repository.mark_failed(current.id, &reason).await?
            }
        };

        match recorded {
            Some(updated) => Ok(updated),
            None => {
                tracing::debug!(
                    "Notification {} changed during delivery, keeping its state",
                    current.id
                );
                self.stored(current.id).await
            }
        }
    }

    async fn stored(&self, notification_id: Uuid) -> Result<Notification> {
        self.repository
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", notification_id)))
    }

    async fn send_email(&self, notification: &Notification) -> std::result::Result<(), String> {
        let recipient = match self.directory.find_by_id(notification.recipient_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err("Recipient not found".to_string()),
            Err(e) => return Err(format!("Recipient lookup failed: {}", e)),
        };

        let Some(address) = recipient.deliverable_email() else {
            return Err("Recipient has no email address".to_string());
        };

        let mail = OutgoingMail {
            to: address.to_string(),
            subject: notification.title.clone(),
            body: notification.body.clone(),
        };

        match self.mail.send(&mail).await {
            Ok(true) => Ok(()),
            Ok(false) => Err("Mail transport rejected the message".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Mark one of the recipient's notifications read
    pub async fn mark_read(&self, notification_id: Uuid, recipient_id: Uuid) -> Result<Notification> {
        let existing = self
            .repository
            .find_by_id(notification_id)
            .await?
            .filter(|n| n.recipient_id == recipient_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        if existing.status == NotificationStatus::Read {
            return Ok(existing);
        }

        self.repository
            .mark_read(notification_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", notification_id)))
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        let updated = self.repository.mark_all_read(recipient_id, Utc::now()).await?;
        tracing::debug!("Marked {} notifications read for {}", updated, recipient_id);
        Ok(updated)
    }

    /// Pending notifications whose scheduled time has passed
    pub async fn find_pending_scheduled(&self) -> Result<Vec<Notification>> {
        self.repository.find_pending_scheduled(Utc::now()).await
    }

    /// Delete read notifications older than `days_old` days
    pub async fn cleanup(&self, days_old: u32) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_old));
        let deleted = self.repository.delete_read_before(cutoff).await?;
        tracing::info!(
            "Notification cleanup removed {} read notifications older than {} days",
            deleted,
            days_old
        );
        Ok(deleted)
    }

    pub async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        self.repository
            .list_for_recipient(recipient_id, unread_only, limit, offset)
            .await
    }

    pub async fn unread_count(&self, recipient_id: Uuid) -> Result<i64> {
        self.repository.count_unread(recipient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::Role;
    use crate::shared::test_helpers::{
        directory_user, FakeMailTransport, InMemoryDirectory, InMemoryNotifications,
    };

    struct Fixture {
        center: NotificationCenter,
        store: Arc<InMemoryNotifications>,
        mail: Arc<FakeMailTransport>,
        directory: Arc<InMemoryDirectory>,
    }

    fn fixture(mail: FakeMailTransport) -> Fixture {
        let store = Arc::new(InMemoryNotifications::default());
        let mail = Arc::new(mail);
        let directory = Arc::new(InMemoryDirectory::default());
        let center = NotificationCenter::new(store.clone(), directory.clone(), mail.clone());
        Fixture {
            center,
            store,
            mail,
            directory,
        }
    }

    fn email_to(recipient_id: Uuid) -> NewNotification {
        NewNotification {
            recipient_id,
            sender_id: None,
            kind: NotificationKind::Email,
            title: "Reminder".to_string(),
            body: "Please upload your visa".to_string(),
            metadata: serde_json::json!({}),
            scheduled_at: None,
        }
    }

    #[tokio::test]
    async fn test_immediate_email_is_sent() {
        let f = fixture(FakeMailTransport::accepting());
        let user = directory_user("Ana", Role::Student, None, Some("ana@uni.edu"));
        f.directory.add(user.clone());

        let created = f.center.create(email_to(user.id)).await.unwrap();

        assert_eq!(created.status, NotificationStatus::Sent);
        assert!(created.sent_at.is_some());
        let sent = f.mail.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@uni.edu");
        assert_eq!(sent[0].subject, "Reminder");
    }

    #[tokio::test]
    async fn test_recipient_without_email_fails_delivery() {
        let f = fixture(FakeMailTransport::accepting());
        let user = directory_user("Ana", Role::Student, None, None);
        f.directory.add(user.clone());

        let created = f.center.create(email_to(user.id)).await.unwrap();

        assert_eq!(created.status, NotificationStatus::Failed);
        assert!(created.metadata.get("delivery_error").is_some());
        assert!(f.mail.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_transport_is_absorbed() {
        let f = fixture(FakeMailTransport::unreachable());
        let user = directory_user("Ana", Role::Student, None, Some("ana@uni.edu"));
        f.directory.add(user.clone());

        let created = f.center.create(email_to(user.id)).await.unwrap();
        assert_eq!(created.status, NotificationStatus::Failed);

        let refused = fixture(FakeMailTransport::refusing());
        refused.directory.add(user.clone());
        let created = refused.center.create(email_to(user.id)).await.unwrap();
        assert_eq!(created.status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_scheduled_email_stays_pending_until_drained() {
        let f = fixture(FakeMailTransport::accepting());
        let user = directory_user("Ana", Role::Student, None, Some("ana@uni.edu"));
        f.directory.add(user.clone());

        let mut data = email_to(user.id);
        data.scheduled_at = Some(Utc::now() - Duration::minutes(1));
        let created = f.center.create(data).await.unwrap();
        assert_eq!(created.status, NotificationStatus::Pending);
        assert!(f.mail.sent().is_empty());

        let mut later = email_to(user.id);
        later.scheduled_at = Some(Utc::now() + Duration::hours(1));
        f.center.create(later).await.unwrap();

        let due = f.center.find_pending_scheduled().await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, created.id);

        let delivered = f.center.deliver(&due[0]).await.unwrap();
        assert_eq!(delivered.status, NotificationStatus::Sent);
        assert!(f.center.find_pending_scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_leaves_read_and_sent_rows_alone() {
        let f = fixture(FakeMailTransport::accepting());
        let user = directory_user("Ana", Role::Student, None, Some("ana@uni.edu"));
        f.directory.add(user.clone());

        let mut data = email_to(user.id);
        data.scheduled_at = Some(Utc::now() - Duration::minutes(1));
        let created = f.center.create(data).await.unwrap();
        let due = f.center.find_pending_scheduled().await.unwrap();
        assert_eq!(due.len(), 1);

        // read from the inbox after the batch was loaded
        f.center.mark_read(created.id, user.id).await.unwrap();
        let outcome = f.center.deliver(&due[0]).await.unwrap();

        assert_eq!(outcome.status, NotificationStatus::Read);
        assert!(outcome.sent_at.is_none());
        assert!(f.mail.sent().is_empty());
        assert_eq!(f.store.all()[0].status, NotificationStatus::Read);

        let immediate = f.center.create(email_to(user.id)).await.unwrap();
        assert_eq!(immediate.status, NotificationStatus::Sent);
        let again = f.center.deliver(&immediate).await.unwrap();
        assert_eq!(again.status, NotificationStatus::Sent);
        assert_eq!(f.mail.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_system_and_sms_delivery() {
        let f = fixture(FakeMailTransport::accepting());
        let recipient = Uuid::new_v4();

        let system = f
            .center
            .create(NewNotification::system(recipient, "Hi".into(), "There".into()))
            .await
            .unwrap();
        assert_eq!(system.status, NotificationStatus::Pending);
        assert_eq!(
            f.center.deliver(&system).await.unwrap().status,
            NotificationStatus::Sent
        );

        let mut sms = NewNotification::system(recipient, "Hi".into(), "There".into());
        sms.kind = NotificationKind::Sms;
        let sms = f.center.create(sms).await.unwrap();
        let delivered = f.center.deliver(&sms).await.unwrap();
        assert_eq!(delivered.status, NotificationStatus::Failed);
        assert!(f.mail.sent().is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_required_fields() {
        let f = fixture(FakeMailTransport::accepting());

        let missing_title = NewNotification::system(Uuid::new_v4(), "  ".into(), "b".into());
        assert!(matches!(
            f.center.create(missing_title).await,
            Err(AppError::Validation(_))
        ));

        let nil_recipient = NewNotification::system(Uuid::nil(), "t".into(), "b".into());
        assert!(matches!(
            f.center.create(nil_recipient).await,
            Err(AppError::Validation(_))
        ));
        assert!(f.store.all().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_is_scoped_to_recipient() {
        let f = fixture(FakeMailTransport::accepting());
        let recipient = Uuid::new_v4();
        let created = f
            .center
            .create(NewNotification::system(recipient, "t".into(), "b".into()))
            .await
            .unwrap();

        assert!(matches!(
            f.center.mark_read(created.id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));

        let read = f.center.mark_read(created.id, recipient).await.unwrap();
        assert_eq!(read.status, NotificationStatus::Read);
        assert!(read.read_at.is_some());
        assert_eq!(f.center.unread_count(recipient).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_read_counts_unread_only() {
        let f = fixture(FakeMailTransport::accepting());
        let recipient = Uuid::new_v4();
        for i in 0..3 {
            f.center
                .create(NewNotification::system(recipient, format!("t{i}"), "b".into()))
                .await
                .unwrap();
        }
        f.center
            .create(NewNotification::system(Uuid::new_v4(), "other".into(), "b".into()))
            .await
            .unwrap();

        assert_eq!(f.center.unread_count(recipient).await.unwrap(), 3);
        assert_eq!(f.center.mark_all_read(recipient).await.unwrap(), 3);
        assert_eq!(f.center.mark_all_read(recipient).await.unwrap(), 0);

        let (unread, total) = f
            .center
            .list_for_recipient(recipient, true, 10, 0)
            .await
            .unwrap();
        assert!(unread.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_old_read_notifications() {
        let f = fixture(FakeMailTransport::accepting());
        let recipient = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..3 {
            let n = f
                .center
                .create(NewNotification::system(recipient, format!("t{i}"), "b".into()))
                .await
                .unwrap();
            ids.push(n.id);
        }

        // old + read, old + unread, recent + read
        f.store.backdate(ids[0], Utc::now() - Duration::days(100));
        f.store.backdate(ids[1], Utc::now() - Duration::days(100));
        f.center.mark_read(ids[0], recipient).await.unwrap();
        f.center.mark_read(ids[2], recipient).await.unwrap();

        assert_eq!(f.center.cleanup(90).await.unwrap(), 1);

        let remaining: Vec<Uuid> = f.store.all().into_iter().map(|n| n.id).collect();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&ids[0]));
    }
}
