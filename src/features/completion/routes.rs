use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::completion::handlers;
use crate::features::completion::services::CompletionService;

pub fn routes(service: Arc<CompletionService>) -> Router {
    Router::new()
        .route(
            "/api/students/{student_id}/completion",
            get(handlers::get_completion_report),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::completion::dtos::CompletionReportDto;
    use crate::shared::test_helpers::{with_user, TestContext};
    use crate::shared::types::ApiResponse;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_student_reads_own_completion() {
        let ctx = TestContext::new();
        let unit = Uuid::new_v4();
        ctx.add_type("visa", true, unit, 1).await;
        ctx.add_type("passport", true, unit, 2).await;
        let student = ctx.add_student("Ana Souza");
        let app = with_user(routes(ctx.completion.clone()), TestContext::actor(&student));
        let server = TestServer::new(app).unwrap();

        let response = server
            .get(&format!("/api/students/{}/completion", student.id))
            .await;

        response.assert_status_ok();
        let body: ApiResponse<CompletionReportDto> = response.json();
        let report = body.data.unwrap();
        assert_eq!(report.total_required, 2);
        assert_eq!(report.completed, 0);
        assert_eq!(report.missing_type_names, vec!["VISA", "PASSPORT"]);
    }

    #[tokio::test]
    async fn test_student_cannot_read_other_student() {
        let ctx = TestContext::new();
        let student = ctx.add_student("Ana Souza");
        let other = ctx.add_student("Bo Chen");
        let app = with_user(routes(ctx.completion.clone()), TestContext::actor(&student));
        let server = TestServer::new(app).unwrap();

        let response = server
            .get(&format!("/api/students/{}/completion", other.id))
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }
}
