use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::features::document_types::handlers;
use crate::features::document_types::services::DocumentTypeService;

/// Create routes for the document type catalog
pub fn routes(service: Arc<DocumentTypeService>) -> Router {
    Router::new()
        .route(
            "/api/document-types",
            get(handlers::list_document_types).post(handlers::create_document_type),
        )
        .route(
            "/api/document-types/{id}",
            patch(handlers::update_document_type),
        )
        .with_state(service)
}
