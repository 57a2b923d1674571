mod document_type;

pub use document_type::{ContentRule, DocumentType, NewDocumentType, UpdateDocumentType};
