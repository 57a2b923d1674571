use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::document_types::models::{
    DocumentType, NewDocumentType, UpdateDocumentType,
};
use crate::features::document_types::repositories::DocumentTypeRepository;

const TYPE_COLUMNS: &str = r#"
    id, code, name, description, required, owning_unit_id, display_order,
    allowed_content, created_at, updated_at
"#;

/// Postgres-backed document type catalog
pub struct PgDocumentTypeRepository {
    pool: PgPool,
}

impl PgDocumentTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentTypeRepository for PgDocumentTypeRepository {
    async fn list_all(&self) -> Result<Vec<DocumentType>> {
        sqlx::query_as::<_, DocumentType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM document_types ORDER BY display_order, name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list document types: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list_required(&self) -> Result<Vec<DocumentType>> {
        sqlx::query_as::<_, DocumentType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM document_types WHERE required = TRUE ORDER BY display_order, name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list required document types: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn find_by_id(&self, type_id: Uuid) -> Result<Option<DocumentType>> {
        sqlx::query_as::<_, DocumentType>(&format!(
            "SELECT {TYPE_COLUMNS} FROM document_types WHERE id = $1"
        ))
        .bind(type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get document type {}: {:?}", type_id, e);
            AppError::Database(e)
        })
    }

    async fn create(&self, data: &NewDocumentType) -> Result<DocumentType> {
        sqlx::query_as::<_, DocumentType>(&format!(
            r#"
            INSERT INTO document_types
                (code, name, description, required, owning_unit_id, display_order, allowed_content)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TYPE_COLUMNS}
            "#
        ))
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.required)
        .bind(data.owning_unit_id)
        .bind(data.display_order)
        .bind(data.allowed_content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Document type code '{}' already exists", data.code))
            } else {
                tracing::error!("Failed to create document type: {:?}", e);
                AppError::Database(e)
            }
        })
    }

    async fn update(
        &self,
        type_id: Uuid,
        data: &UpdateDocumentType,
    ) -> Result<Option<DocumentType>> {
        sqlx::query_as::<_, DocumentType>(&format!(
            r#"
            UPDATE document_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                required = COALESCE($4, required),
                owning_unit_id = COALESCE($5, owning_unit_id),
                display_order = COALESCE($6, display_order),
                allowed_content = COALESCE($7, allowed_content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TYPE_COLUMNS}
            "#
        ))
        .bind(type_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.required)
        .bind(data.owning_unit_id)
        .bind(data.display_order)
        .bind(data.allowed_content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update document type {}: {:?}", type_id, e);
            AppError::Database(e)
        })
    }
}
