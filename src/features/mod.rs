pub mod auth;
pub mod completion;
pub mod document_types;
pub mod documents;
pub mod notifications;
pub mod scheduler;
pub mod tracking;
pub mod users;
