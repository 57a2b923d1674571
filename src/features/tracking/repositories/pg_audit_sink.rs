use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::tracking::models::NewAuditEntry;
use crate::features::tracking::repositories::AuditSink;

/// Audit sink writing to the `document_tracking` table
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, entry: NewAuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO document_tracking (student_id, document_id, user_id, action, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.student_id)
        .bind(entry.document_id)
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(&entry.description)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
