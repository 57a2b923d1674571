use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::completion::engine::{CompletionReport, MissingType};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MissingTypeDto {
    pub type_id: Uuid,
    pub name: String,
    pub owning_unit_id: Uuid,
}

impl From<MissingType> for MissingTypeDto {
    fn from(m: MissingType) -> Self {
        Self {
            type_id: m.type_id,
            name: m.name,
            owning_unit_id: m.owning_unit_id,
        }
    }
}

/// Response DTO for a student's completion report
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompletionReportDto {
    pub student_id: Uuid,
    pub total_required: usize,
    pub completed: usize,
    #[schema(example = 50.0)]
    pub completion_rate: f64,
    pub missing_type_names: Vec<String>,
    pub missing_types: Vec<MissingTypeDto>,
}

impl From<CompletionReport> for CompletionReportDto {
    fn from(r: CompletionReport) -> Self {
        Self {
            student_id: r.student_id,
            total_required: r.total_required,
            completed: r.completed,
            completion_rate: r.completion_rate,
            missing_type_names: r.missing_type_names,
            missing_types: r.missing_types.into_iter().map(Into::into).collect(),
        }
    }
}
