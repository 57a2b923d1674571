//! In-app and email notifications with deferred delivery and retention.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{NotificationRepository, PgNotificationRepository};
pub use routes::routes;
pub use services::NotificationCenter;
