mod document_type_repository;
mod pg_document_type_repository;

pub use document_type_repository::DocumentTypeRepository;
pub use pg_document_type_repository::PgDocumentTypeRepository;
