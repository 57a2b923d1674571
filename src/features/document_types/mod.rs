//! Document type catalog: the rulebook of which documents students must
//! submit, which unit owns each type and what content each type accepts.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{DocumentTypeRepository, PgDocumentTypeRepository};
pub use routes::routes;
pub use services::DocumentTypeService;
