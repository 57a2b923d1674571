//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the blob storage and mail transport ports together with their
//! production adapters.

pub mod mail;
pub mod storage;
