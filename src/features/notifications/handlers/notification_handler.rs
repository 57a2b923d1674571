use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::guards::RequireStaff;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications::dtos::{
    CreateNotificationDto, ListNotificationsQuery, MarkAllReadResponseDto,
    NotificationResponseDto, UnreadCountDto,
};
use crate::features::notifications::services::NotificationCenter;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(PaginationQuery, ListNotificationsQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = ApiResponse<Vec<NotificationResponseDto>>),
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    user: AuthenticatedUser,
    State(center): State<Arc<NotificationCenter>>,
    Query(pagination): Query<PaginationQuery>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationResponseDto>>>> {
    let (items, total) = center
        .list_for_recipient(
            user.user_id,
            query.unread_only,
            pagination.limit(),
            pagination.offset(),
        )
        .await?;

    let items = items.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Count the caller's unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = ApiResponse<UnreadCountDto>),
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    user: AuthenticatedUser,
    State(center): State<Arc<NotificationCenter>>,
) -> Result<Json<ApiResponse<UnreadCountDto>>> {
    let unread = center.unread_count(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(UnreadCountDto { unread }),
        None,
        None,
    )))
}

/// Send a notification to a user
#[utoipa::path(
    post,
    path = "/api/notifications",
    request_body = CreateNotificationDto,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<NotificationResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Staff access required")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn create_notification(
    RequireStaff(sender): RequireStaff,
    State(center): State<Arc<NotificationCenter>>,
    ValidatedJson(dto): ValidatedJson<CreateNotificationDto>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponseDto>>)> {
    let created = center.create(dto.into_new(sender.user_id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created.into()), None, None)),
    ))
}

/// Mark a notification read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<NotificationResponseDto>),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    user: AuthenticatedUser,
    State(center): State<Arc<NotificationCenter>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationResponseDto>>> {
    let updated = center.mark_read(id, user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(updated.into()), None, None)))
}

/// Mark all of the caller's notifications read
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications updated", body = ApiResponse<MarkAllReadResponseDto>),
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    user: AuthenticatedUser,
    State(center): State<Arc<NotificationCenter>>,
) -> Result<Json<ApiResponse<MarkAllReadResponseDto>>> {
    let updated = center.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(MarkAllReadResponseDto { updated }),
        None,
        None,
    )))
}
