use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::features::document_types::models::DocumentType;
use crate::features::documents::models::StudentDocument;

/// A required type the student has not satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingType {
    pub type_id: Uuid,
    pub name: String,
    pub owning_unit_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub student_id: Uuid,
    pub total_required: usize,
    pub completed: usize,
    /// Percentage in `0.0..=100.0`, rounded to two decimals
    pub completion_rate: f64,
    pub missing_type_names: Vec<String>,
    pub missing_types: Vec<MissingType>,
}

/// Compare the required part of `catalog` against a student's current documents.
///
/// A required type counts as completed when the student has a current
/// document for it whose status is not `rejected`. Missing types are listed in
/// catalog display order. With no required types the rate is 0.
pub fn compute_completion(
    student_id: Uuid,
    catalog: &[DocumentType],
    current_documents: &[StudentDocument],
) -> CompletionReport {
    let mut required: Vec<&DocumentType> = catalog.iter().filter(|t| t.required).collect();
    required.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
    });

    let satisfied: HashSet<Uuid> = current_documents
        .iter()
        .filter(|d| d.student_id == student_id && d.is_current && d.status.counts_as_completed())
        .map(|d| d.type_id)
        .collect();

    let missing_types: Vec<MissingType> = required
        .iter()
        .filter(|t| !satisfied.contains(&t.id))
        .map(|t| MissingType {
            type_id: t.id,
            name: t.name.clone(),
            owning_unit_id: t.owning_unit_id,
        })
        .collect();

    let total_required = required.len();
    let completed = total_required - missing_types.len();

    CompletionReport {
        student_id,
        total_required,
        completed,
        completion_rate: completion_rate(completed, total_required),
        missing_type_names: missing_types.iter().map(|m| m.name.clone()).collect(),
        missing_types,
    }
}

fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}
