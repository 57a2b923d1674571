use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::scheduler::handlers;
use crate::features::scheduler::services::ComplianceScheduler;

pub fn routes(scheduler: Arc<ComplianceScheduler>) -> Router {
    Router::new()
        .route("/api/admin/scheduler/jobs", get(handlers::list_jobs))
        .route(
            "/api/admin/scheduler/jobs/{name}/trigger",
            post(handlers::trigger_job),
        )
        .route("/api/admin/scheduler/jobs/{name}/start", post(handlers::start_job))
        .route("/api/admin/scheduler/jobs/{name}/stop", post(handlers::stop_job))
        .route(
            "/api/admin/scheduler/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .with_state(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SchedulerConfig;
    use crate::features::scheduler::dtos::ScheduleSettingsDto;
    use crate::features::scheduler::models::ScheduleSettings;
    use crate::features::scheduler::workers::ComplianceJobs;
    use crate::features::users::Role;
    use crate::shared::test_helpers::{directory_user, with_user, TestContext};
    use crate::shared::types::ApiResponse;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn server_for(ctx: &TestContext, role: Role) -> TestServer {
        let jobs = Arc::new(ComplianceJobs::new(
            ctx.notifications.clone(),
            ctx.completion.clone(),
            ctx.directory.clone(),
        ));
        let config = SchedulerConfig::default();
        let settings = ScheduleSettings::from_config(&config).unwrap();
        let scheduler = Arc::new(ComplianceScheduler::new(
            jobs,
            &config,
            settings.into_shared(),
        ));
        let user = directory_user("Operator", role, None, None);
        TestServer::new(with_user(routes(scheduler), TestContext::actor(&user))).unwrap()
    }

    #[tokio::test]
    async fn test_admin_triggers_job() {
        let ctx = TestContext::new();
        let server = server_for(&ctx, Role::Admin);

        let response = server
            .post("/api/admin/scheduler/jobs/retention_cleanup/trigger")
            .await;

        response.assert_status_ok();
        let body: ApiResponse<serde_json::Value> = response.json();
        assert_eq!(body.data.unwrap()["job"], "retention_cleanup");
    }

    #[tokio::test]
    async fn test_reviewer_cannot_reach_scheduler() {
        let ctx = TestContext::new();
        let server = server_for(&ctx, Role::Reviewer);

        let response = server.get("/api/admin/scheduler/jobs").await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_settings_update_round_trips() {
        let ctx = TestContext::new();
        let server = server_for(&ctx, Role::Admin);

        server
            .put("/api/admin/scheduler/settings")
            .json(&json!({
                "enabled": true,
                "overdue_scan_time": "06:30",
                "reminder_window_days": 14,
                "notify_roles": ["reviewer"]
            }))
            .await
            .assert_status_ok();

        let body: ApiResponse<ScheduleSettingsDto> =
            server.get("/api/admin/scheduler/settings").await.json();
        let settings = body.data.unwrap();
        assert_eq!(settings.overdue_scan_time, "06:30");
        assert_eq!(settings.reminder_window_days, 14);
        assert_eq!(settings.notify_roles, vec![Role::Reviewer]);
    }

    #[tokio::test]
    async fn test_settings_reject_bad_time() {
        let ctx = TestContext::new();
        let server = server_for(&ctx, Role::Admin);

        let response = server
            .put("/api/admin/scheduler/settings")
            .json(&json!({
                "enabled": true,
                "overdue_scan_time": "late",
                "reminder_window_days": 14,
                "notify_roles": ["reviewer"]
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
