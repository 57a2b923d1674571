mod document_type_handler;

pub use document_type_handler::*;
