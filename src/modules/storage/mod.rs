//! Storage module for uploaded document files
//!
//! Defines the [`BlobStorage`] port and the MinIO/S3-compatible adapter.

mod blob_storage;
mod minio_client;

pub use blob_storage::{normalize_key, BlobStorage, StoredBlob};
pub use minio_client::MinIOClient;
