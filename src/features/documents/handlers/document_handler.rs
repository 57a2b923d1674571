use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ValidatedJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::documents::dtos::{
    ChangeStatusDto, CurrentDocumentResponseDto, DocumentResponseDto, UploadDocumentDto,
};
use crate::features::documents::models::DocumentStatus;
use crate::features::documents::services::{DocumentService, UploadPayload};
use crate::shared::types::{ApiResponse, Meta};

fn ensure_can_view(user: &AuthenticatedUser, student_id: Uuid) -> Result<()> {
    if user.can_act_for_student(student_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You may not view this student's documents".to_string(),
        ))
    }
}

/// Upload a new document version
///
/// Accepts multipart/form-data with either:
/// - `file`: the document file
/// - `url`: an external link
///
/// and an optional `remarks` field.
#[utoipa::path(
    post,
    path = "/api/students/{student_id}/documents/{type_id}",
    params(
        ("student_id" = Uuid, Path, description = "Student ID"),
        ("type_id" = Uuid, Path, description = "Document type ID")
    ),
    request_body(
        content = UploadDocumentDto,
        content_type = "multipart/form-data",
        description = "A file or a url, plus optional remarks",
    ),
    responses(
        (status = 201, description = "New current version created", body = ApiResponse<DocumentResponseDto>),
        (status = 400, description = "Invalid upload"),
        (status = 403, description = "Not allowed to upload for this student"),
        (status = 404, description = "Student or document type not found")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn upload_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path((student_id, type_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponseDto>>)> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut url: Option<String> = None;
    let mut remarks: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let mime = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;
                file = Some((name, mime, data.to_vec()));
            }
            "url" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read url field: {}", e))
                })?;
                if !text.trim().is_empty() {
                    url = Some(text);
                }
            }
            "remarks" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read remarks field: {}", e))
                })?;
                if !text.trim().is_empty() {
                    remarks = Some(text);
                }
            }
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    let payload = match (file, url) {
        (Some((name, mime, data)), None) => UploadPayload::File { name, mime, data },
        (None, Some(url)) => UploadPayload::WebLink { url },
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Provide either a file or a url, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "A file or a url is required".to_string(),
            ))
        }
    };

    let created = service
        .upload(&user, student_id, type_id, payload, remarks)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(created.into()), None, None)),
    ))
}

/// List a student's current documents
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/documents",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Current document per type", body = ApiResponse<Vec<CurrentDocumentResponseDto>>),
        (status = 403, description = "Not allowed to view this student")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn list_current_documents(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CurrentDocumentResponseDto>>>> {
    ensure_can_view(&user, student_id)?;

    let documents: Vec<CurrentDocumentResponseDto> = service
        .find_all_current(student_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = documents.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(documents),
        None,
        Some(Meta { total }),
    )))
}

/// Get the current version for one document type
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/documents/{type_id}",
    params(
        ("student_id" = Uuid, Path, description = "Student ID"),
        ("type_id" = Uuid, Path, description = "Document type ID")
    ),
    responses(
        (status = 200, description = "Current version", body = ApiResponse<DocumentResponseDto>),
        (status = 404, description = "No current version")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn get_current_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path((student_id, type_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<DocumentResponseDto>>> {
    ensure_can_view(&user, student_id)?;

    let current = service
        .find_current(student_id, type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No current document for this type".to_string()))?;

    Ok(Json(ApiResponse::success(Some(current.into()), None, None)))
}

/// List all versions for one document type, newest first
#[utoipa::path(
    get,
    path = "/api/students/{student_id}/documents/{type_id}/history",
    params(
        ("student_id" = Uuid, Path, description = "Student ID"),
        ("type_id" = Uuid, Path, description = "Document type ID")
    ),
    responses(
        (status = 200, description = "Version history", body = ApiResponse<Vec<DocumentResponseDto>>),
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn get_version_history(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path((student_id, type_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Vec<DocumentResponseDto>>>> {
    ensure_can_view(&user, student_id)?;

    let history: Vec<DocumentResponseDto> = service
        .version_history(student_id, type_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = history.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(history),
        None,
        Some(Meta { total }),
    )))
}

/// Get a single document version
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document version", body = ApiResponse<DocumentResponseDto>),
        (status = 404, description = "Document not found")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn get_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DocumentResponseDto>>> {
    let document = service.get(id).await?;
    ensure_can_view(&user, document.student_id)?;
    Ok(Json(ApiResponse::success(Some(document.into()), None, None)))
}

/// Download the stored file of a document version
#[utoipa::path(
    get,
    path = "/api/documents/{id}/download",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 400, description = "Document is a web link"),
        (status = 404, description = "Document not found")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn download_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (file, bytes) = service.download(&user, id).await?;
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&file.name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, file.mime),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Delete a document version
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 403, description = "Only the uploader or an admin may delete"),
        (status = 404, description = "Document not found")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn delete_document(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a review decision on the current version
#[utoipa::path(
    post,
    path = "/api/documents/{id}/status",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = ChangeStatusDto,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<DocumentResponseDto>),
        (status = 403, description = "Not a reviewer of the owning unit"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Version has been superseded")
    ),
    tag = "documents",
    security(("bearer_auth" = []))
)]
pub async fn change_document_status(
    user: AuthenticatedUser,
    State(service): State<Arc<DocumentService>>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<ChangeStatusDto>,
) -> Result<Json<ApiResponse<DocumentResponseDto>>> {
    let updated = match dto.status {
        DocumentStatus::Approved => service.approve(&user, id, dto.remarks).await?,
        DocumentStatus::Rejected => service.reject(&user, id, dto.remarks).await?,
        DocumentStatus::UnderReview => service.set_under_review(&user, id).await?,
        DocumentStatus::Pending => service.set_pending(&user, id).await?,
    };

    Ok(Json(ApiResponse::success(Some(updated.into()), None, None)))
}
