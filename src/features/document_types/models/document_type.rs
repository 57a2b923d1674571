use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which content kinds a document type accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema, Default)]
#[sqlx(type_name = "content_rule", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentRule {
    File,
    WebLink,
    #[default]
    Any,
}

impl ContentRule {
    pub fn allows_file(&self) -> bool {
        matches!(self, ContentRule::File | ContentRule::Any)
    }

    pub fn allows_web_link(&self) -> bool {
        matches!(self, ContentRule::WebLink | ContentRule::Any)
    }
}

/// Database model for a document type
#[derive(Debug, Clone, FromRow)]
pub struct DocumentType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub owning_unit_id: Uuid,
    pub display_order: i32,
    pub allowed_content: ContentRule,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a document type
#[derive(Debug, Clone)]
pub struct NewDocumentType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub owning_unit_id: Uuid,
    pub display_order: i32,
    pub allowed_content: ContentRule,
}

/// Mutable fields of a document type; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub owning_unit_id: Option<Uuid>,
    pub display_order: Option<i32>,
    pub allowed_content: Option<ContentRule>,
}
