use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::users::models::{DirectoryUser, Role};

/// Port for reading users from the identity directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by id, active or not.
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<DirectoryUser>>;

    /// All active students.
    async fn list_active_students(&self) -> Result<Vec<DirectoryUser>>;

    /// Active staff of a unit whose role is in `roles`.
    async fn list_active_staff(&self, unit_id: Uuid, roles: &[Role]) -> Result<Vec<DirectoryUser>>;
}
