use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// User role enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Reviewer,
    UnitAdmin,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Reviewer => "reviewer",
            Role::UnitAdmin => "unit_admin",
            Role::Admin => "admin",
        }
    }

    /// Staff roles work on behalf of a unit
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Student)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "reviewer" => Ok(Role::Reviewer),
            "unit_admin" => Ok(Role::UnitAdmin),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// A user as seen through the user directory
#[derive(Debug, Clone, FromRow)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub unit_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl DirectoryUser {
    /// Email address usable for delivery, if any
    pub fn deliverable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
