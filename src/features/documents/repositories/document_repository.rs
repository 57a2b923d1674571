use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::documents::models::{
    CurrentDocumentView, DocumentDraft, DocumentStatus, StudentDocument,
};

/// Port for versioned document storage.
///
/// Implementations keep exactly one current row per (student, type) group
/// and never reuse a version number within a group.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Atomically demote the group's current version and insert `draft` as
    /// the new current version with status `pending`.
    async fn create_version(&self, draft: &DocumentDraft) -> Result<StudentDocument>;

    async fn find_by_id(&self, document_id: Uuid) -> Result<Option<StudentDocument>>;

    async fn find_current(&self, student_id: Uuid, type_id: Uuid)
        -> Result<Option<StudentDocument>>;

    async fn find_all_current(&self, student_id: Uuid) -> Result<Vec<StudentDocument>>;

    /// Current documents joined with uploader name and unit
    async fn find_all_current_with_uploader(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<CurrentDocumentView>>;

    /// All versions of a group, newest first
    async fn version_history(&self, student_id: Uuid, type_id: Uuid)
        -> Result<Vec<StudentDocument>>;

    /// Set status and remarks on a row that is still current.
    ///
    /// Returns `None` when the row is missing or no longer current.
    async fn update_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        remarks: Option<&str>,
    ) -> Result<Option<StudentDocument>>;

    /// Remove a row and return it. Other versions are left untouched.
    async fn delete(&self, document_id: Uuid) -> Result<Option<StudentDocument>>;
}
