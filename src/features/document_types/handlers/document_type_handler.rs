use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::document_types::dtos::{
    CreateDocumentTypeDto, DocumentTypeResponseDto, ListDocumentTypesQuery, UpdateDocumentTypeDto,
};
use crate::features::document_types::services::DocumentTypeService;
use crate::shared::types::{ApiResponse, Meta};

/// List document types
#[utoipa::path(
    get,
    path = "/api/document-types",
    params(ListDocumentTypesQuery),
    responses(
        (status = 200, description = "Document types in display order", body = ApiResponse<Vec<DocumentTypeResponseDto>>),
    ),
    tag = "document-types",
    security(("bearer_auth" = []))
)]
pub async fn list_document_types(
    _user: AuthenticatedUser,
    State(service): State<Arc<DocumentTypeService>>,
    Query(query): Query<ListDocumentTypesQuery>,
) -> Result<Json<ApiResponse<Vec<DocumentTypeResponseDto>>>> {
    let types: Vec<DocumentTypeResponseDto> = service
        .list(query.required_only)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = types.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(types),
        None,
        Some(Meta { total }),
    )))
}

/// Create a document type
#[utoipa::path(
    post,
    path = "/api/document-types",
    request_body = CreateDocumentTypeDto,
    responses(
        (status = 201, description = "Document type created", body = ApiResponse<DocumentTypeResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Code already exists")
    ),
    tag = "document-types",
    security(("bearer_auth" = []))
)]
pub async fn create_document_type(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<DocumentTypeService>>,
    ValidatedJson(dto): ValidatedJson<CreateDocumentTypeDto>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentTypeResponseDto>>)> {
    let created = service.create(dto.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created.into()), None, None)),
    ))
}

/// Update a document type
#[utoipa::path(
    patch,
    path = "/api/document-types/{id}",
    params(("id" = Uuid, Path, description = "Document type ID")),
    request_body = UpdateDocumentTypeDto,
    responses(
        (status = 200, description = "Document type updated", body = ApiResponse<DocumentTypeResponseDto>),
        (status = 404, description = "Document type not found")
    ),
    tag = "document-types",
    security(("bearer_auth" = []))
)]
pub async fn update_document_type(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<DocumentTypeService>>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateDocumentTypeDto>,
) -> Result<Json<ApiResponse<DocumentTypeResponseDto>>> {
    let updated = service.update(id, dto.into()).await?;
    Ok(Json(ApiResponse::success(Some(updated.into()), None, None)))
}
