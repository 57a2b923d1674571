mod notification_repository;
mod pg_notification_repository;

pub use notification_repository::NotificationRepository;
pub use pg_notification_repository::PgNotificationRepository;
