use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::core::database::is_unique_violation;
use crate::core::error::{AppError, Result};
use crate::features::documents::models::{
    next_version, CurrentDocumentView, DocumentContent, DocumentDraft, DocumentRow,
    DocumentStatus, StudentDocument,
};
use crate::features::documents::repositories::DocumentRepository;

const DOCUMENT_COLUMNS: &str = r#"
    d.id, d.student_id, d.type_id, d.uploader_id, d.content_kind::TEXT AS content_kind,
    d.file_path, d.file_name, d.file_size, d.mime_type, d.web_url,
    d.status, d.version, d.is_current, d.remarks, d.uploaded_at, d.updated_at
"#;

#[derive(Debug, FromRow)]
struct CurrentDocumentRow {
    #[sqlx(flatten)]
    document: DocumentRow,
    uploader_name: Option<String>,
    uploader_unit_id: Option<Uuid>,
}

fn into_documents(rows: Vec<DocumentRow>) -> Result<Vec<StudentDocument>> {
    rows.into_iter().map(StudentDocument::try_from).collect()
}

/// Postgres-backed document store
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn create_version(&self, draft: &DocumentDraft) -> Result<StudentDocument> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to start document transaction: {:?}", e);
            AppError::Database(e)
        })?;

        // Serialises concurrent uploads for the same group until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT || ':' || $2::TEXT, 0))")
            .bind(draft.student_id)
            .bind(draft.type_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock document group: {:?}", e);
                AppError::Database(e)
            })?;

        let latest: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(version) FROM student_documents WHERE student_id = $1 AND type_id = $2",
        )
        .bind(draft.student_id)
        .bind(draft.type_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to read latest document version: {:?}", e);
            AppError::Database(e)
        })?;

        sqlx::query(
            r#"
            UPDATE student_documents
            SET is_current = FALSE, updated_at = NOW()
            WHERE student_id = $1 AND type_id = $2 AND is_current = TRUE
            "#,
        )
        .bind(draft.student_id)
        .bind(draft.type_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to demote current document: {:?}", e);
            AppError::Database(e)
        })?;

        let (file_path, file_name, file_size, mime_type, web_url) = match &draft.content {
            DocumentContent::File(file) => (
                Some(file.path.as_str()),
                Some(file.name.as_str()),
                Some(file.size),
                Some(file.mime.as_str()),
                None,
            ),
            DocumentContent::WebLink { url } => (None, None, None, None, Some(url.as_str())),
        };

        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            INSERT INTO student_documents AS d
                (student_id, type_id, uploader_id, content_kind, file_path, file_name,
                 file_size, mime_type, web_url, status, version, is_current, remarks)
            VALUES ($1, $2, $3, $4::document_content_kind, $5, $6, $7, $8, $9, $10, $11, TRUE, $12)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(draft.student_id)
        .bind(draft.type_id)
        .bind(draft.uploader_id)
        .bind(draft.content.kind())
        .bind(file_path)
        .bind(file_name)
        .bind(file_size)
        .bind(mime_type)
        .bind(web_url)
        .bind(DocumentStatus::Pending)
        .bind(next_version(latest))
        .bind(&draft.remarks)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("A concurrent upload created this version first".to_string())
            } else {
                tracing::error!("Failed to insert document version: {:?}", e);
                AppError::Database(e)
            }
        })?;

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit document version: {:?}", e);
            AppError::Database(e)
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, document_id: Uuid) -> Result<Option<StudentDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM student_documents d WHERE d.id = $1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get document {}: {:?}", document_id, e);
            AppError::Database(e)
        })?;

        row.map(StudentDocument::try_from).transpose()
    }

    async fn find_current(
        &self,
        student_id: Uuid,
        type_id: Uuid,
    ) -> Result<Option<StudentDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM student_documents d
            WHERE d.student_id = $1 AND d.type_id = $2 AND d.is_current = TRUE
            "#
        ))
        .bind(student_id)
        .bind(type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get current document: {:?}", e);
            AppError::Database(e)
        })?;

        row.map(StudentDocument::try_from).transpose()
    }

    async fn find_all_current(&self, student_id: Uuid) -> Result<Vec<StudentDocument>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM student_documents d
            WHERE d.student_id = $1 AND d.is_current = TRUE
            ORDER BY d.uploaded_at DESC
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list current documents for {}: {:?}", student_id, e);
            AppError::Database(e)
        })?;

        into_documents(rows)
    }

    async fn find_all_current_with_uploader(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<CurrentDocumentView>> {
        let rows = sqlx::query_as::<_, CurrentDocumentRow>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS},
                   u.full_name AS uploader_name,
                   u.unit_id AS uploader_unit_id
            FROM student_documents d
            LEFT JOIN users u ON u.id = d.uploader_id
            WHERE d.student_id = $1 AND d.is_current = TRUE
            ORDER BY d.uploaded_at DESC
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list current documents for {}: {:?}", student_id, e);
            AppError::Database(e)
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(CurrentDocumentView {
                    document: row.document.try_into()?,
                    uploader_name: row.uploader_name,
                    uploader_unit_id: row.uploader_unit_id,
                })
            })
            .collect()
    }

    async fn version_history(
        &self,
        student_id: Uuid,
        type_id: Uuid,
    ) -> Result<Vec<StudentDocument>> {
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS} FROM student_documents d
            WHERE d.student_id = $1 AND d.type_id = $2
            ORDER BY d.version DESC
            "#
        ))
        .bind(student_id)
        .bind(type_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load version history: {:?}", e);
            AppError::Database(e)
        })?;

        into_documents(rows)
    }

    async fn update_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        remarks: Option<&str>,
    ) -> Result<Option<StudentDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            UPDATE student_documents AS d
            SET status = $2, remarks = COALESCE($3, d.remarks), updated_at = NOW()
            WHERE d.id = $1 AND d.is_current = TRUE
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(status)
        .bind(remarks)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update status of document {}: {:?}", document_id, e);
            AppError::Database(e)
        })?;

        row.map(StudentDocument::try_from).transpose()
    }

    async fn delete(&self, document_id: Uuid) -> Result<Option<StudentDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "DELETE FROM student_documents AS d WHERE d.id = $1 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete document {}: {:?}", document_id, e);
            AppError::Database(e)
        })?;

        row.map(StudentDocument::try_from).transpose()
    }
}
