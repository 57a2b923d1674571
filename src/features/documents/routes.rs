use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::documents::handlers;
use crate::features::documents::services::DocumentService;
use crate::shared::constants::MAX_FILE_SIZE;

pub fn routes(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route(
            "/api/students/{student_id}/documents",
            get(handlers::list_current_documents),
        )
        .route(
            "/api/students/{student_id}/documents/{type_id}",
            get(handlers::get_current_document).post(handlers::upload_document),
        )
        .route(
            "/api/students/{student_id}/documents/{type_id}/history",
            get(handlers::get_version_history),
        )
        .route(
            "/api/documents/{id}",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        .route("/api/documents/{id}/download", get(handlers::download_document))
        .route(
            "/api/documents/{id}/status",
            post(handlers::change_document_status),
        )
        // Multipart overhead on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::dtos::DocumentResponseDto;
    use crate::features::documents::models::DocumentStatus;
    use crate::shared::test_helpers::{with_user, TestContext};
    use crate::shared::types::ApiResponse;
    use axum::http::StatusCode;
    use axum_test::multipart::MultipartForm;
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_student_uploads_link_and_reads_history() {
        let ctx = TestContext::new();
        let doc_type = ctx.add_type("visa", true, Uuid::new_v4(), 1).await;
        let student = ctx.add_student("Ana Souza");
        let app = with_user(routes(ctx.documents.clone()), TestContext::actor(&student));
        let server = TestServer::new(app).unwrap();
        let path = format!("/api/students/{}/documents/{}", student.id, doc_type.id);

        for _ in 0..2 {
            let form = MultipartForm::new().add_text("url", "https://docs.example.org/visa");
            let response = server.post(&path).multipart(form).await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server.get(&format!("{}/history", path)).await;
        response.assert_status_ok();
        let body: ApiResponse<Vec<DocumentResponseDto>> = response.json();
        let history = body.data.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version, 2);
        assert!(history[0].is_current);
        assert!(!history[1].is_current);
        assert_eq!(history[0].status, DocumentStatus::Pending);
    }

    #[tokio::test]
    async fn test_upload_without_content_is_rejected() {
        let ctx = TestContext::new();
        let doc_type = ctx.add_type("visa", true, Uuid::new_v4(), 1).await;
        let student = ctx.add_student("Ana Souza");
        let app = with_user(routes(ctx.documents.clone()), TestContext::actor(&student));
        let server = TestServer::new(app).unwrap();

        let form = MultipartForm::new().add_text("remarks", "nothing attached");
        let response = server
            .post(&format!(
                "/api/students/{}/documents/{}",
                student.id, doc_type.id
            ))
            .multipart(form)
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_student_cannot_change_status() {
        let ctx = TestContext::new();
        let doc_type = ctx.add_type("visa", true, Uuid::new_v4(), 1).await;
        let student = ctx.add_student("Ana Souza");
        let app = with_user(routes(ctx.documents.clone()), TestContext::actor(&student));
        let server = TestServer::new(app).unwrap();

        let form = MultipartForm::new().add_text("url", "https://docs.example.org/visa");
        let created: ApiResponse<DocumentResponseDto> = server
            .post(&format!(
                "/api/students/{}/documents/{}",
                student.id, doc_type.id
            ))
            .multipart(form)
            .await
            .json();
        let document = created.data.unwrap();

        let response = server
            .post(&format!("/api/documents/{}/status", document.id))
            .json(&json!({ "status": "approved" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }
}
