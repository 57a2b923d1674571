use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::models::DocumentStatus;

/// Metadata of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileContent {
    /// Storage path returned by the blob store
    pub path: String,
    /// Original file name
    pub name: String,
    pub size: i64,
    pub mime: String,
}

/// What a document version carries: a stored file or an external link, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentContent {
    File(FileContent),
    WebLink { url: String },
}

impl DocumentContent {
    pub fn as_file(&self) -> Option<&FileContent> {
        match self {
            DocumentContent::File(file) => Some(file),
            DocumentContent::WebLink { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DocumentContent::File(_) => "file",
            DocumentContent::WebLink { .. } => "web_link",
        }
    }
}

/// One version of a student's submission for a document type
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDocument {
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

/// Flat database row for `student_documents`
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub type_id: Uuid,
    pub uploader_id: Uuid,
    pub content_kind: String,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub web_url: Option<String>,
    pub status: DocumentStatus,
    pub version: i32,
    pub is_current: bool,
    pub remarks: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for StudentDocument {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self> {
        let content = match row.content_kind.as_str() {
            "file" => match (row.file_path, row.file_name, row.file_size, row.mime_type) {
                (Some(path), Some(name), Some(size), Some(mime)) => {
                    DocumentContent::File(FileContent {
                        path,
                        name,
                        size,
                        mime,
                    })
                }
                _ => {
                    return Err(AppError::Internal(format!(
                        "Document {} is a file without file metadata",
                        row.id
                    )))
                }
            },
            "web_link" => match row.web_url {
                Some(url) => DocumentContent::WebLink { url },
                None => {
                    return Err(AppError::Internal(format!(
                        "Document {} is a link without a URL",
                        row.id
                    )))
                }
            },
            other => {
                return Err(AppError::Internal(format!(
                    "Document {} has unknown content kind '{}'",
                    row.id, other
                )))
            }
        };

        Ok(Self {
            id: row.id,
            student_id: row.student_id,
            type_id: row.type_id,
            uploader_id: row.uploader_id,
            content,
            status: row.status,
            version: row.version,
            is_current: row.is_current,
            remarks: row.remarks,
            uploaded_at: row.uploaded_at,
            updated_at: row.updated_at,
        })
    }
}

/// A current document together with who uploaded it
#[derive(Debug, Clone)]
pub struct CurrentDocumentView {
    pub document: StudentDocument,
    pub uploader_name: Option<String>,
    pub uploader_unit_id: Option<Uuid>,
}

/// Input for a new version. New versions always start as `pending`.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    pub student_id: Uuid,
    pub type_id: Uuid,
    pub uploader_id: Uuid,
    pub content: DocumentContent,
    pub remarks: Option<String>,
}

/// Version number for the next upload in a (student, type) group
pub fn next_version(latest: Option<i32>) -> i32 {
    latest.map_or(1, |v| v + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str) -> DocumentRow {
        DocumentRow {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            type_id: Uuid::new_v4(),
            uploader_id: Uuid::new_v4(),
            content_kind: kind.to_string(),
            file_path: None,
            file_name: None,
            file_size: None,
            mime_type: None,
            web_url: None,
            status: DocumentStatus::Pending,
            version: 1,
            is_current: true,
            remarks: None,
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_next_version_starts_at_one() {
        assert_eq!(next_version(None), 1);
        assert_eq!(next_version(Some(3)), 4);
    }

    #[test]
    fn test_file_row_converts() {
        let mut r = row("file");
        r.file_path = Some("s/t/a.pdf".to_string());
        r.file_name = Some("a.pdf".to_string());
        r.file_size = Some(12);
        r.mime_type = Some("application/pdf".to_string());

        let doc = StudentDocument::try_from(r).unwrap();
        assert_eq!(doc.content.as_file().map(|f| f.size), Some(12));
        assert_eq!(doc.content.kind(), "file");
    }

    #[test]
    fn test_link_row_converts() {
        let mut r = row("web_link");
        r.web_url = Some("https://example.edu/cert".to_string());

        let doc = StudentDocument::try_from(r).unwrap();
        assert_eq!(
            doc.content,
            DocumentContent::WebLink {
                url: "https://example.edu/cert".to_string()
            }
        );
    }

    #[test]
    fn test_incomplete_rows_are_rejected() {
        assert!(StudentDocument::try_from(row("file")).is_err());
        assert!(StudentDocument::try_from(row("web_link")).is_err());
        assert!(StudentDocument::try_from(row("fax")).is_err());
    }
}
