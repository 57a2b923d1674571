mod status;
mod student_document;

pub use status::DocumentStatus;
pub use student_document::{
    next_version, CurrentDocumentView, DocumentContent, DocumentDraft, DocumentRow, FileContent,
    StudentDocument,
};
