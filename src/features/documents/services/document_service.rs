use std::sync::Arc;

use minijinja::context;
use serde_json::json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::document_types::models::DocumentType;
use crate::features::document_types::repositories::DocumentTypeRepository;
use crate::features::documents::models::{
    CurrentDocumentView, DocumentContent, DocumentDraft, DocumentStatus, FileContent,
    StudentDocument,
};
use crate::features::documents::repositories::DocumentRepository;
use crate::features::notifications::models::NewNotification;
use crate::features::notifications::NotificationCenter;
use crate::features::scheduler::models::SharedScheduleSettings;
use crate::features::tracking::{track, AuditAction, AuditSink, NewAuditEntry};
use crate::features::users::{DirectoryUser, Role, UserDirectory};
use crate::modules::storage::BlobStorage;
use crate::shared::constants::{extension_for_mime, is_mime_type_allowed, MAX_FILE_SIZE};
use crate::shared::templates::{render_message, MessageTemplate};
use crate::shared::validation::is_http_url;

/// What a caller submits for a new version
#[derive(Debug, Clone)]
pub enum UploadPayload {
    File {
        name: String,
        mime: String,
        data: Vec<u8>,
    },
    WebLink {
        url: String,
    },
}

/// Versioned document store with review workflow
pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    types: Arc<dyn DocumentTypeRepository>,
    storage: Arc<dyn BlobStorage>,
    audit: Arc<dyn AuditSink>,
    directory: Arc<dyn UserDirectory>,
    notifications: Arc<NotificationCenter>,
    /// Source of the staff roles told about uploads
    settings: SharedScheduleSettings,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        types: Arc<dyn DocumentTypeRepository>,
        storage: Arc<dyn BlobStorage>,
        audit: Arc<dyn AuditSink>,
        directory: Arc<dyn UserDirectory>,
        notifications: Arc<NotificationCenter>,
        settings: SharedScheduleSettings,
    ) -> Self {
        Self {
            documents,
            types,
            storage,
            audit,
            directory,
            notifications,
            settings,
        }
    }

    async fn document_type(&self, type_id: Uuid) -> Result<DocumentType> {
        self.types
            .find_by_id(type_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document type {} not found", type_id)))
    }

    /// Get any version by id
    pub async fn get(&self, document_id: Uuid) -> Result<StudentDocument> {
        self.documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))
    }

    /// Store `draft` as the new current version of its group.
    ///
    /// The previous current version (if any) is demoted in the same step.
    /// The new version starts as `pending`.
    pub async fn create_new_version(&self, draft: DocumentDraft) -> Result<StudentDocument> {
        let doc_type = self.document_type(draft.type_id).await?;
        validate_content(&doc_type, &draft.content)?;

        let created = self.documents.create_version(&draft).await?;
        tracing::info!(
            "Document version created: id={}, student={}, type={}, version={}",
            created.id,
            created.student_id,
            created.type_id,
            created.version
        );
        Ok(created)
    }

    /// Accept a submission from `actor` for `student_id`.
    ///
    /// Files are written to blob storage first; if the version cannot be
    /// recorded afterwards the blob is removed again.
    pub async fn upload(
        &self,
        actor: &AuthenticatedUser,
        student_id: Uuid,
        type_id: Uuid,
        payload: UploadPayload,
        remarks: Option<String>,
    ) -> Result<StudentDocument> {
        if !actor.can_act_for_student(student_id) {
            return Err(AppError::Forbidden(
                "You may only upload documents for yourself".to_string(),
            ));
        }

        let doc_type = self.document_type(type_id).await?;
        let student = self
            .directory
            .find_by_id(student_id)
            .await?
            .filter(|u| u.role == Role::Student)
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))?;

        let content = match payload {
            UploadPayload::File { name, mime, data } => {
                if !doc_type.allowed_content.allows_file() {
                    return Err(AppError::Validation(format!(
                        "'{}' does not accept file uploads",
                        doc_type.name
                    )));
                }
                if data.is_empty() {
                    return Err(AppError::Validation("Uploaded file is empty".to_string()));
                }
                if data.len() > MAX_FILE_SIZE {
                    return Err(AppError::Validation(format!(
                        "File exceeds the maximum size of {} bytes",
                        MAX_FILE_SIZE
                    )));
                }
                if !is_mime_type_allowed(&mime) {
                    return Err(AppError::Validation(format!(
                        "File type '{}' is not accepted",
                        mime
                    )));
                }

                let key = format!(
                    "{}/{}/{}.{}",
                    student_id,
                    type_id,
                    Uuid::now_v7(),
                    extension_for_mime(&mime)
                );
                let blob = self.storage.save(&key, data, &mime).await?;
                DocumentContent::File(FileContent {
                    path: blob.path,
                    name,
                    size: blob.size,
                    mime: blob.mime,
                })
            }
            UploadPayload::WebLink { url } => DocumentContent::WebLink {
                url: url.trim().to_string(),
            },
        };

        let draft = DocumentDraft {
            student_id,
            type_id,
            uploader_id: actor.user_id,
            content: content.clone(),
            remarks,
        };

        let created = match self.create_new_version(draft).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(file) = content.as_file() {
                    self.remove_blob(&file.path).await;
                }
                return Err(e);
            }
        };

        track(
            self.audit.as_ref(),
            NewAuditEntry {
                student_id: Some(student_id),
                document_id: Some(created.id),
                user_id: actor.user_id,
                action: AuditAction::Upload,
                description: format!("Uploaded version {} of {}", created.version, doc_type.name),
                metadata: json!({
                    "type_id": type_id,
                    "version": created.version,
                    "content_kind": created.content.kind(),
                }),
            },
        )
        .await;

        self.notify_unit_staff(actor, &doc_type, &student, &created)
            .await;

        Ok(created)
    }

    pub async fn find_current(
        &self,
        student_id: Uuid,
        type_id: Uuid,
    ) -> Result<Option<StudentDocument>> {
        self.documents.find_current(student_id, type_id).await
    }

    pub async fn find_all_current(&self, student_id: Uuid) -> Result<Vec<CurrentDocumentView>> {
        self.documents.find_all_current_with_uploader(student_id).await
    }

    pub async fn version_history(
        &self,
        student_id: Uuid,
        type_id: Uuid,
    ) -> Result<Vec<StudentDocument>> {
        self.documents.version_history(student_id, type_id).await
    }

    /// Read the stored bytes of a file version
    pub async fn download(
        &self,
        actor: &AuthenticatedUser,
        document_id: Uuid,
    ) -> Result<(FileContent, Vec<u8>)> {
        let document = self.get(document_id).await?;
        if !actor.can_act_for_student(document.student_id) {
            return Err(AppError::Forbidden(
                "You may not access this document".to_string(),
            ));
        }

        let DocumentContent::File(file) = document.content else {
            return Err(AppError::BadRequest(
                "Document is a web link and has no file".to_string(),
            ));
        };

        let bytes = self.storage.read(&file.path).await?;
        Ok((file, bytes))
    }

    /// Remove one version. No other version is promoted to current.
    pub async fn delete(&self, actor: &AuthenticatedUser, document_id: Uuid) -> Result<()> {
        let document = self.get(document_id).await?;
        if !actor.is_admin() && actor.user_id != document.uploader_id {
            return Err(AppError::Forbidden(
                "Only the uploader or an administrator may delete a document".to_string(),
            ));
        }

        let removed = self
            .documents
            .delete(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        if removed.is_current {
            if let Some(file) = removed.content.as_file() {
                self.remove_blob(&file.path).await;
            }
        }

        tracing::info!(
            "Document deleted: id={}, student={}, version={}, was_current={}",
            removed.id,
            removed.student_id,
            removed.version,
            removed.is_current
        );

        track(
            self.audit.as_ref(),
            NewAuditEntry {
                student_id: Some(removed.student_id),
                document_id: Some(removed.id),
                user_id: actor.user_id,
                action: AuditAction::Delete,
                description: format!("Deleted version {}", removed.version),
                metadata: json!({
                    "type_id": removed.type_id,
                    "version": removed.version,
                    "was_current": removed.is_current,
                }),
            },
        )
        .await;

        Ok(())
    }

    pub async fn approve(
        &self,
        actor: &AuthenticatedUser,
        document_id: Uuid,
        remarks: Option<String>,
    ) -> Result<StudentDocument> {
        self.change_status(actor, document_id, DocumentStatus::Approved, remarks)
            .await
    }

    pub async fn reject(
        &self,
        actor: &AuthenticatedUser,
        document_id: Uuid,
        remarks: Option<String>,
    ) -> Result<StudentDocument> {
        self.change_status(actor, document_id, DocumentStatus::Rejected, remarks)
            .await
    }

    pub async fn set_under_review(
        &self,
        actor: &AuthenticatedUser,
        document_id: Uuid,
    ) -> Result<StudentDocument> {
        self.change_status(actor, document_id, DocumentStatus::UnderReview, None)
            .await
    }

    pub async fn set_pending(
        &self,
        actor: &AuthenticatedUser,
        document_id: Uuid,
    ) -> Result<StudentDocument> {
        self.change_status(actor, document_id, DocumentStatus::Pending, None)
            .await
    }

    /// Move the current version of a group to `target`.
    ///
    /// Any status may follow any other, including the same one with fresh
    /// remarks. Superseded versions are frozen. Only admins and reviewers of
    /// the type's owning unit may change status.
    pub async fn change_status(
        &self,
        actor: &AuthenticatedUser,
        document_id: Uuid,
        target: DocumentStatus,
        remarks: Option<String>,
    ) -> Result<StudentDocument> {
        let document = self.get(document_id).await?;
        let doc_type = self.document_type(document.type_id).await?;

        if !actor.can_review_for_unit(doc_type.owning_unit_id) {
            return Err(AppError::Forbidden(format!(
                "You may not review '{}' documents",
                doc_type.name
            )));
        }
        if !document.is_current {
            return Err(AppError::Conflict(format!(
                "Version {} has been superseded and cannot change status",
                document.version
            )));
        }
        let remarks = remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let updated = self
            .documents
            .update_status(document_id, target, remarks.as_deref())
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Document was superseded during the update".to_string())
            })?;

        tracing::info!(
            "Document {} status {} -> {} by {}",
            updated.id,
            document.status,
            updated.status,
            actor.user_id
        );

        track(
            self.audit.as_ref(),
            NewAuditEntry {
                student_id: Some(updated.student_id),
                document_id: Some(updated.id),
                user_id: actor.user_id,
                action: AuditAction::StatusChange,
                description: format!("Status changed from {} to {}", document.status, target),
                metadata: json!({
                    "from": document.status,
                    "to": target,
                    "remarks": remarks,
                }),
            },
        )
        .await;

        self.notify_student(actor, &doc_type, &updated).await;

        Ok(updated)
    }

    async fn remove_blob(&self, path: &str) {
        match self.storage.delete(path).await {
            Ok(true) => tracing::debug!("Removed stored file {}", path),
            Ok(false) => tracing::warn!("Stored file {} was already gone", path),
            Err(e) => tracing::warn!("Failed to remove stored file {}: {}", path, e),
        }
    }

    async fn notify_unit_staff(
        &self,
        actor: &AuthenticatedUser,
        doc_type: &DocumentType,
        student: &DirectoryUser,
        document: &StudentDocument,
    ) {
        let notify_roles = self.settings.read().await.notify_roles.clone();
        let staff = match self
            .directory
            .list_active_staff(doc_type.owning_unit_id, &notify_roles)
            .await
        {
            Ok(staff) => staff,
            Err(e) => {
                tracing::warn!("Failed to load unit staff for upload notice: {}", e);
                return;
            }
        };

        let message = match render_message(
            MessageTemplate::DocumentUploaded,
            &context! {
                student_name => &student.full_name,
                type_name => &doc_type.name,
                version => document.version,
            },
        ) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to render upload notice: {}", e);
                return;
            }
        };

        for member in staff.iter().filter(|m| m.id != actor.user_id) {
            let notification =
                NewNotification::system(member.id, message.title.clone(), message.body.clone())
                    .with_metadata(json!({
                        "document_id": document.id,
                        "student_id": document.student_id,
                        "type_id": document.type_id,
                    }));
            if let Err(e) = self.notifications.create(notification).await {
                tracing::warn!("Failed to notify {} of upload: {}", member.id, e);
            }
        }
    }

    async fn notify_student(
        &self,
        actor: &AuthenticatedUser,
        doc_type: &DocumentType,
        document: &StudentDocument,
    ) {
        let message = match render_message(
            MessageTemplate::StatusChanged,
            &context! {
                type_name => &doc_type.name,
                version => document.version,
                status => document.status.to_string(),
                remarks => &document.remarks,
            },
        ) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to render status notice: {}", e);
                return;
            }
        };

        let mut notification =
            NewNotification::system(document.student_id, message.title, message.body)
                .with_metadata(json!({
                    "document_id": document.id,
                    "type_id": document.type_id,
                    "status": document.status,
                }));
        notification.sender_id = Some(actor.user_id);

        if let Err(e) = self.notifications.create(notification).await {
            tracing::warn!(
                "Failed to notify student {} of status change: {}",
                document.student_id,
                e
            );
        }
    }
}

/// Check content against the type's rule and the content's own shape
fn validate_content(doc_type: &DocumentType, content: &DocumentContent) -> Result<()> {
    match content {
        DocumentContent::File(file) => {
            if !doc_type.allowed_content.allows_file() {
                return Err(AppError::Validation(format!(
                    "'{}' does not accept file uploads",
                    doc_type.name
                )));
            }
            if file.path.trim().is_empty() || file.name.trim().is_empty() {
                return Err(AppError::Validation(
                    "File path and name are required".to_string(),
                ));
            }
            if file.size <= 0 || file.mime.trim().is_empty() {
                return Err(AppError::Validation(
                    "File size and MIME type are required".to_string(),
                ));
            }
        }
        DocumentContent::WebLink { url } => {
            if !doc_type.allowed_content.allows_web_link() {
                return Err(AppError::Validation(format!(
                    "'{}' does not accept web links",
                    doc_type.name
                )));
            }
            if !is_http_url(url) {
                return Err(AppError::Validation(format!(
                    "'{}' is not a valid http(s) URL",
                    url
                )));
            }
        }
    }
    Ok(())
}
