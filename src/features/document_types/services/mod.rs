mod document_type_service;

pub use document_type_service::DocumentTypeService;
