use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::notifications::handlers;
use crate::features::notifications::services::NotificationCenter;

pub fn routes(center: Arc<NotificationCenter>) -> Router {
    Router::new()
        .route(
            "/api/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route("/api/notifications/unread-count", get(handlers::unread_count))
        .route("/api/notifications/read-all", post(handlers::mark_all_read))
        .route("/api/notifications/{id}/read", post(handlers::mark_read))
        .with_state(center)
}
