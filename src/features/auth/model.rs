use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::users::Role;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
    /// Organisational unit for staff accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<Uuid>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Whether the user may review documents owned by `unit_id`.
    ///
    /// Admins review everything; reviewers and unit admins only their own unit.
    pub fn can_review_for_unit(&self, unit_id: Uuid) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Reviewer | Role::UnitAdmin => self.unit_id == Some(unit_id),
            Role::Student => false,
        }
    }

    /// Whether the user may submit or remove documents on behalf of `student_id`
    pub fn can_act_for_student(&self, student_id: Uuid) -> bool {
        self.user_id == student_id || self.is_staff()
    }
}

/// Claims placed by the identity provider under the service namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomClaims {
    pub role: Role,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, unit_id: Option<Uuid>) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            role,
            unit_id,
        }
    }

    #[test]
    fn test_review_permission_is_scoped_to_unit() {
        let unit = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(user(Role::Admin, None).can_review_for_unit(unit));
        assert!(user(Role::Reviewer, Some(unit)).can_review_for_unit(unit));
        assert!(!user(Role::Reviewer, Some(other)).can_review_for_unit(unit));
        assert!(user(Role::UnitAdmin, Some(unit)).can_review_for_unit(unit));
        assert!(!user(Role::Student, Some(unit)).can_review_for_unit(unit));
    }

    #[test]
    fn test_students_only_act_for_themselves() {
        let student = user(Role::Student, None);
        assert!(student.can_act_for_student(student.user_id));
        assert!(!student.can_act_for_student(Uuid::new_v4()));
        assert!(user(Role::Reviewer, None).can_act_for_student(Uuid::new_v4()));
    }
}
