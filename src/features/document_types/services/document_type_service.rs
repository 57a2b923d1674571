use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::document_types::models::{
    DocumentType, NewDocumentType, UpdateDocumentType,
};
use crate::features::document_types::repositories::DocumentTypeRepository;
use crate::shared::validation::CODE_REGEX;

/// Service for the document type catalog
pub struct DocumentTypeService {
    repository: Arc<dyn DocumentTypeRepository>,
}

impl DocumentTypeService {
    pub fn new(repository: Arc<dyn DocumentTypeRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, required_only: bool) -> Result<Vec<DocumentType>> {
        if required_only {
            self.repository.list_required().await
        } else {
            self.repository.list_all().await
        }
    }

    /// Get a document type or fail with `NotFound`
    pub async fn get(&self, type_id: Uuid) -> Result<DocumentType> {
        self.repository
            .find_by_id(type_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document type {} not found", type_id)))
    }

    pub async fn create(&self, data: NewDocumentType) -> Result<DocumentType> {
        if !CODE_REGEX.is_match(&data.code) {
            return Err(AppError::Validation(format!(
                "Invalid document type code '{}'",
                data.code
            )));
        }
        if data.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Document type name is required".to_string(),
            ));
        }

        let created = self.repository.create(&data).await?;
        tracing::info!(
            "Document type created: id={}, code={}, required={}",
            created.id,
            created.code,
            created.required
        );
        Ok(created)
    }

    pub async fn update(&self, type_id: Uuid, data: UpdateDocumentType) -> Result<DocumentType> {
        if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation(
                "Document type name must not be empty".to_string(),
            ));
        }

        let updated = self
            .repository
            .update(type_id, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document type {} not found", type_id)))?;

        tracing::info!(
            "Document type updated: id={}, required={}, owning_unit={}",
            updated.id,
            updated.required,
            updated.owning_unit_id
        );
        Ok(updated)
    }
}
