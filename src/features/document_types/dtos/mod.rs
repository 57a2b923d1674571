mod document_type_dto;

pub use document_type_dto::*;
