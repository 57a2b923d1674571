use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

/// Review status of a document version, matching the database enum.
///
/// Usual workflow:
///
/// | from | to |
/// |------|----|
/// | pending | under_review, approved, rejected |
/// | under_review | approved, rejected, pending |
/// | approved | rejected, pending |
/// | rejected | pending, under_review |
///
/// The table is not enforced. Reviewers may set any status from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl DocumentStatus {
    /// Whether a current document in this status satisfies its type for
    /// completion purposes. Rejected documents must be re-submitted.
    pub fn counts_as_completed(&self) -> bool {
        !matches!(self, DocumentStatus::Rejected)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::UnderReview => write!(f, "under_review"),
            DocumentStatus::Approved => write!(f, "approved"),
            DocumentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentStatus::*;

    #[test]
    fn test_only_rejected_fails_completion() {
        assert!(Pending.counts_as_completed());
        assert!(UnderReview.counts_as_completed());
        assert!(Approved.counts_as_completed());
        assert!(!Rejected.counts_as_completed());
    }
}
