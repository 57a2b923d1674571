//! Student documents: append-only version history per (student, type),
//! exactly one current version per group, and the review workflow.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{DocumentRepository, PgDocumentRepository};
pub use routes::routes;
pub use services::DocumentService;
