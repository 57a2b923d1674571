use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{DirectoryUser, Role};
use crate::features::users::repositories::UserDirectory;

const USER_COLUMNS: &str = "id, full_name, email, role, unit_id, active, created_at";

/// Postgres-backed user directory
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<DirectoryUser>> {
        sqlx::query_as::<_, DirectoryUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find user {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    async fn list_active_students(&self) -> Result<Vec<DirectoryUser>> {
        sqlx::query_as::<_, DirectoryUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 AND active = TRUE ORDER BY created_at"
        ))
        .bind(Role::Student)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list active students: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn list_active_staff(&self, unit_id: Uuid, roles: &[Role]) -> Result<Vec<DirectoryUser>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, DirectoryUser>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE unit_id = $1 AND active = TRUE AND role = ANY($2)
            ORDER BY full_name
            "#
        ))
        .bind(unit_id)
        .bind(roles.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list staff of unit {}: {:?}", unit_id, e);
            AppError::Database(e)
        })
    }
}
