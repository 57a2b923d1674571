use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::completion::{dtos as completion_dtos, handlers as completion_handlers};
use crate::features::document_types::{
    dtos as document_types_dtos, handlers as document_types_handlers,
    models as document_types_models,
};
use crate::features::documents::{
    dtos as documents_dtos, handlers as documents_handlers, models as documents_models,
};
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
    models as notifications_models,
};
use crate::features::scheduler::{
    dtos as scheduler_dtos, handlers as scheduler_handlers, models as scheduler_models,
};
use crate::features::users::Role;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Document types
        document_types_handlers::list_document_types,
        document_types_handlers::create_document_type,
        document_types_handlers::update_document_type,
        // Documents
        documents_handlers::upload_document,
        documents_handlers::list_current_documents,
        documents_handlers::get_current_document,
        documents_handlers::get_version_history,
        documents_handlers::get_document,
        documents_handlers::download_document,
        documents_handlers::delete_document,
        documents_handlers::change_document_status,
        // Completion
        completion_handlers::get_completion_report,
        // Notifications
        notifications_handlers::list_notifications,
        notifications_handlers::unread_count,
        notifications_handlers::create_notification,
        notifications_handlers::mark_read,
        notifications_handlers::mark_all_read,
        // Scheduler (admin)
        scheduler_handlers::list_jobs,
        scheduler_handlers::trigger_job,
        scheduler_handlers::start_job,
        scheduler_handlers::stop_job,
        scheduler_handlers::get_settings,
        scheduler_handlers::update_settings,
    ),
    components(
        schemas(
            // Shared
            Meta,
            Role,
            auth::model::AuthenticatedUser,
            // Document types
            document_types_models::ContentRule,
            document_types_dtos::CreateDocumentTypeDto,
            document_types_dtos::UpdateDocumentTypeDto,
            document_types_dtos::DocumentTypeResponseDto,
            ApiResponse<document_types_dtos::DocumentTypeResponseDto>,
            ApiResponse<Vec<document_types_dtos::DocumentTypeResponseDto>>,
            // Documents
            documents_models::DocumentStatus,
            documents_models::DocumentContent,
            documents_models::FileContent,
            documents_dtos::UploadDocumentDto,
            documents_dtos::ChangeStatusDto,
            documents_dtos::DocumentResponseDto,
            documents_dtos::CurrentDocumentResponseDto,
            ApiResponse<documents_dtos::DocumentResponseDto>,
            ApiResponse<Vec<documents_dtos::DocumentResponseDto>>,
            ApiResponse<Vec<documents_dtos::CurrentDocumentResponseDto>>,
            // Completion
            completion_dtos::MissingTypeDto,
            completion_dtos::CompletionReportDto,
            ApiResponse<completion_dtos::CompletionReportDto>,
            // Notifications
            notifications_models::NotificationKind,
            notifications_models::NotificationStatus,
            notifications_dtos::CreateNotificationDto,
            notifications_dtos::NotificationResponseDto,
            notifications_dtos::UnreadCountDto,
            notifications_dtos::MarkAllReadResponseDto,
            ApiResponse<notifications_dtos::NotificationResponseDto>,
            ApiResponse<Vec<notifications_dtos::NotificationResponseDto>>,
            ApiResponse<notifications_dtos::UnreadCountDto>,
            ApiResponse<notifications_dtos::MarkAllReadResponseDto>,
            // Scheduler
            scheduler_models::JobName,
            scheduler_models::JobStatus,
            scheduler_models::JobRunReport,
            scheduler_dtos::ScheduleSettingsDto,
            ApiResponse<Vec<scheduler_models::JobStatus>>,
            ApiResponse<scheduler_models::JobRunReport>,
            ApiResponse<scheduler_dtos::ScheduleSettingsDto>,
        )
    ),
    tags(
        (name = "document-types", description = "Catalog of required and optional document types"),
        (name = "documents", description = "Student document uploads, versions and review"),
        (name = "completion", description = "Per-student compliance completion"),
        (name = "notifications", description = "In-app and email notifications"),
        (name = "scheduler", description = "Background compliance jobs (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Compliance Documents API",
        version = "0.1.0",
        description = "API documentation for student compliance document tracking",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_document_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc
            .paths
            .paths
            .contains_key("/api/students/{student_id}/documents/{type_id}"));
        assert!(doc.paths.paths.contains_key("/api/admin/scheduler/settings"));
    }
}
