//! Compliance completion: how many required document types a student has
//! satisfied with an acceptable current document.

pub mod dtos;
pub mod engine;
pub mod handlers;
pub mod routes;
pub mod services;

pub use engine::{compute_completion, CompletionReport, MissingType};
pub use routes::routes;
pub use services::CompletionService;
