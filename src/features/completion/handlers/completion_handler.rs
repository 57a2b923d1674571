use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::completion::dtos::CompletionReportDto;
use crate::features::completion::services::CompletionService;
use crate::shared::types::ApiResponse;

/// Get a student's compliance completion report
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/completion",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Completion report", body = ApiResponse<CompletionReportDto>),
        (status = 403, description = "Not allowed to view this student")
    ),
    tag = "completion",
    security(("bearer_auth" = []))
)]
pub async fn get_completion_report(
    user: AuthenticatedUser,
    State(service): State<Arc<CompletionService>>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CompletionReportDto>>> {
    if !user.can_act_for_student(student_id) {
        return Err(AppError::Forbidden(
            "You may not view this student's completion".to_string(),
        ));
    }

    let report = service.report_for(student_id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}
