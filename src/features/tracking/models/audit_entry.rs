use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Audit action enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Upload,
    StatusChange,
    Delete,
}

/// Data for appending an audit entry
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub student_id: Option<Uuid>,
    pub document_id: Option<Uuid>,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub description: String,
    pub metadata: serde_json::Value,
}
