use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::document_types::models::{
    DocumentType, NewDocumentType, UpdateDocumentType,
};

/// Port for the document type catalog.
///
/// Listings are ordered by `display_order`, then name.
#[async_trait]
pub trait DocumentTypeRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<DocumentType>>;

    async fn list_required(&self) -> Result<Vec<DocumentType>>;

    async fn find_by_id(&self, type_id: Uuid) -> Result<Option<DocumentType>>;

    /// Insert a type. A duplicate code is a `Conflict`.
    async fn create(&self, data: &NewDocumentType) -> Result<DocumentType>;

    /// Apply an update; `None` when the type does not exist.
    async fn update(&self, type_id: Uuid, data: &UpdateDocumentType)
        -> Result<Option<DocumentType>>;
}
