use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::documents::models::{
    CurrentDocumentView, DocumentContent, DocumentStatus, StudentDocument,
};

/// Multipart form for uploading a document version (OpenAPI only).
///
/// Exactly one of `file` or `url` must be present.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Option<String>,
    /// External link instead of a file
    #[schema(example = "https://immigration.example.gov/permit/123")]
    pub url: Option<String>,
    pub remarks: Option<String>,
}

/// Request DTO for a review decision
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeStatusDto {
    pub status: DocumentStatus,
    #[validate(length(max = 2000, message = "remarks must be at most 2000 characters"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponseDto {
    pub id: Uuid,
    pub student_id: Uuid,
    pub type_id: Uuid,
    pub uploader_id: Uuid,
    pub content: DocumentContent,
    pub status: DocumentStatus,
    pub version: i32,
    pub is_current: bool,
    pub remarks: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentDocument> for DocumentResponseDto {
    fn from(d: StudentDocument) -> Self {
        Self {
            id: d.id,
            student_id: d.student_id,
            type_id: d.type_id,
            uploader_id: d.uploader_id,
            content: d.content,
            status: d.status,
            version: d.version,
            is_current: d.is_current,
            remarks: d.remarks,
            uploaded_at: d.uploaded_at,
            updated_at: d.updated_at,
        }
    }
}

/// A current document with uploader details
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentDocumentResponseDto {
    #[serde(flatten)]
    pub document: DocumentResponseDto,
    pub uploader_name: Option<String>,
    pub uploader_unit_id: Option<Uuid>,
}

impl From<CurrentDocumentView> for CurrentDocumentResponseDto {
    fn from(view: CurrentDocumentView) -> Self {
        Self {
            document: view.document.into(),
            uploader_name: view.uploader_name,
            uploader_unit_id: view.uploader_unit_id,
        }
    }
}
