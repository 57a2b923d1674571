use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::completion::engine::{compute_completion, CompletionReport};
use crate::features::document_types::models::DocumentType;
use crate::features::document_types::repositories::DocumentTypeRepository;
use crate::features::documents::repositories::DocumentRepository;

/// Loads catalog and documents and runs the completion computation
pub struct CompletionService {
    types: Arc<dyn DocumentTypeRepository>,
    documents: Arc<dyn DocumentRepository>,
}

impl CompletionService {
    pub fn new(
        types: Arc<dyn DocumentTypeRepository>,
        documents: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self { types, documents }
    }

    pub async fn required_types(&self) -> Result<Vec<DocumentType>> {
        self.types.list_required().await
    }

    pub async fn report_for(&self, student_id: Uuid) -> Result<CompletionReport> {
        let required = self.required_types().await?;
        self.report_with_catalog(student_id, &required).await
    }

    /// Compute a report against an already loaded catalog (batch callers)
    pub async fn report_with_catalog(
        &self,
        student_id: Uuid,
        catalog: &[DocumentType],
    ) -> Result<CompletionReport> {
        let current = self.documents.find_all_current(student_id).await?;
        Ok(compute_completion(student_id, catalog, &current))
    }
}
