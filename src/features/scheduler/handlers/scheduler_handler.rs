use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::scheduler::dtos::ScheduleSettingsDto;
use crate::features::scheduler::models::{JobName, JobRunReport, JobStatus};
use crate::features::scheduler::services::ComplianceScheduler;
use crate::shared::types::ApiResponse;

/// List job status
#[utoipa::path(
    get,
    path = "/api/admin/scheduler/jobs",
    responses(
        (status = 200, description = "Status of every job", body = ApiResponse<Vec<JobStatus>>),
        (status = 403, description = "Admin access required")
    ),
    tag = "scheduler",
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    RequireAdmin(_admin): RequireAdmin,
    State(scheduler): State<Arc<ComplianceScheduler>>,
) -> Result<Json<ApiResponse<Vec<JobStatus>>>> {
    let statuses = scheduler.get_job_status().await;
    Ok(Json(ApiResponse::success(Some(statuses), None, None)))
}

/// Run a job immediately
#[utoipa::path(
    post,
    path = "/api/admin/scheduler/jobs/{name}/trigger",
    params(("name" = JobName, Path, description = "Job name")),
    responses(
        (status = 200, description = "Run report", body = ApiResponse<JobRunReport>),
        (status = 403, description = "Admin access required")
    ),
    tag = "scheduler",
    security(("bearer_auth" = []))
)]
pub async fn trigger_job(
    RequireAdmin(admin): RequireAdmin,
    State(scheduler): State<Arc<ComplianceScheduler>>,
    Path(name): Path<JobName>,
) -> Result<Json<ApiResponse<JobRunReport>>> {
    tracing::info!("Job {} triggered manually by {}", name, admin.user_id);
    let report = scheduler.trigger_job(name).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}

/// Start a job's timer
#[utoipa::path(
    post,
    path = "/api/admin/scheduler/jobs/{name}/start",
    params(("name" = JobName, Path, description = "Job name")),
    responses(
        (status = 200, description = "Job status after starting", body = ApiResponse<Vec<JobStatus>>),
        (status = 409, description = "Overdue reminders are disabled"),
    ),
    tag = "scheduler",
    security(("bearer_auth" = []))
)]
pub async fn start_job(
    RequireAdmin(_admin): RequireAdmin,
    State(scheduler): State<Arc<ComplianceScheduler>>,
    Path(name): Path<JobName>,
) -> Result<Json<ApiResponse<Vec<JobStatus>>>> {
    scheduler.start_job(name).await?;
    Ok(Json(ApiResponse::success(
        Some(scheduler.get_job_status().await),
        None,
        None,
    )))
}

/// Stop a job's timer
#[utoipa::path(
    post,
    path = "/api/admin/scheduler/jobs/{name}/stop",
    params(("name" = JobName, Path, description = "Job name")),
    responses(
        (status = 200, description = "Job status after stopping", body = ApiResponse<Vec<JobStatus>>),
    ),
    tag = "scheduler",
    security(("bearer_auth" = []))
)]
pub async fn stop_job(
    RequireAdmin(_admin): RequireAdmin,
    State(scheduler): State<Arc<ComplianceScheduler>>,
    Path(name): Path<JobName>,
) -> Result<Json<ApiResponse<Vec<JobStatus>>>> {
    let was_running = scheduler.stop_job(name).await;
    let message = (!was_running).then(|| format!("Job {} was not running", name));
    Ok(Json(ApiResponse::success(
        Some(scheduler.get_job_status().await),
        message,
        None,
    )))
}

/// Get reminder settings
#[utoipa::path(
    get,
    path = "/api/admin/scheduler/settings",
    responses(
        (status = 200, description = "Current settings", body = ApiResponse<ScheduleSettingsDto>),
    ),
    tag = "scheduler",
    security(("bearer_auth" = []))
)]
pub async fn get_settings(
    RequireAdmin(_admin): RequireAdmin,
    State(scheduler): State<Arc<ComplianceScheduler>>,
) -> Result<Json<ApiResponse<ScheduleSettingsDto>>> {
    let settings = scheduler.settings().await;
    Ok(Json(ApiResponse::success(Some(settings.into()), None, None)))
}

/// Update reminder settings
#[utoipa::path(
    put,
    path = "/api/admin/scheduler/settings",
    request_body = ScheduleSettingsDto,
    responses(
        (status = 200, description = "Settings applied", body = ApiResponse<ScheduleSettingsDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "scheduler",
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    RequireAdmin(_admin): RequireAdmin,
    State(scheduler): State<Arc<ComplianceScheduler>>,
    ValidatedJson(dto): ValidatedJson<ScheduleSettingsDto>,
) -> Result<Json<ApiResponse<ScheduleSettingsDto>>> {
    scheduler.update_schedule_settings(dto.try_into()?).await?;
    let settings = scheduler.settings().await;
    Ok(Json(ApiResponse::success(Some(settings.into()), None, None)))
}
