use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::document_types::models::{
    ContentRule, DocumentType, NewDocumentType, UpdateDocumentType,
};
use crate::shared::validation::CODE_REGEX;

/// Request DTO for creating a document type
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDocumentTypeDto {
    /// Unique slug, lowercase with hyphens
    #[validate(regex(path = *CODE_REGEX, message = "code must be lowercase alphanumeric with hyphens"))]
    #[schema(example = "residence-permit")]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    #[schema(example = "Residence Permit")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub owning_unit_id: Uuid,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub allowed_content: ContentRule,
}

impl From<CreateDocumentTypeDto> for NewDocumentType {
    fn from(dto: CreateDocumentTypeDto) -> Self {
        Self {
            code: dto.code,
            name: dto.name.trim().to_string(),
            description: dto.description,
            required: dto.required,
            owning_unit_id: dto.owning_unit_id,
            display_order: dto.display_order,
            allowed_content: dto.allowed_content,
        }
    }
}

/// Request DTO for updating a document type
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDocumentTypeDto {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub owning_unit_id: Option<Uuid>,
    pub display_order: Option<i32>,
    pub allowed_content: Option<ContentRule>,
}

impl From<UpdateDocumentTypeDto> for UpdateDocumentType {
    fn from(dto: UpdateDocumentTypeDto) -> Self {
        Self {
            name: dto.name.map(|n| n.trim().to_string()),
            description: dto.description,
            required: dto.required,
            owning_unit_id: dto.owning_unit_id,
            display_order: dto.display_order,
            allowed_content: dto.allowed_content,
        }
    }
}

/// Response DTO for a document type
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentTypeResponseDto {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub owning_unit_id: Uuid,
    pub display_order: i32,
    pub allowed_content: ContentRule,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentType> for DocumentTypeResponseDto {
    fn from(t: DocumentType) -> Self {
        Self {
            id: t.id,
            code: t.code,
            name: t.name,
            description: t.description,
            required: t.required,
            owning_unit_id: t.owning_unit_id,
            display_order: t.display_order,
            allowed_content: t.allowed_content,
            updated_at: t.updated_at,
        }
    }
}

/// Query params for listing document types
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListDocumentTypesQuery {
    /// If true, only required types are returned
    #[serde(default)]
    pub required_only: bool,
}
