use async_trait::async_trait;

use crate::core::error::{AppError, Result};

/// Location and shape of a stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub path: String,
    pub size: i64,
    pub mime: String,
}

/// Port for storing uploaded document bytes.
///
/// Keys are relative; adapters reject keys that would escape their root.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `data` under `key`.
    async fn save(&self, key: &str, data: Vec<u8>, mime: &str) -> Result<StoredBlob>;

    /// Remove a blob. Returns `false` when nothing was stored under `path`.
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Read a blob back.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Normalise a relative storage key, refusing traversal and absolute paths
pub fn normalize_key(key: &str) -> Result<String> {
    let segments: Vec<&str> = key
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.is_empty() {
        return Err(AppError::Storage("Empty storage key".to_string()));
    }

    if segments
        .iter()
        .any(|segment| *segment == ".." || segment.contains('\\'))
    {
        return Err(AppError::Storage(format!(
            "Storage key '{}' escapes the storage root",
            key
        )));
    }

    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_collapses_separators() {
        assert_eq!(normalize_key("/a//b/./c.pdf").unwrap(), "a/b/c.pdf");
    }

    #[test]
    fn test_normalize_key_rejects_traversal() {
        assert!(matches!(
            normalize_key("a/../../etc/passwd"),
            Err(AppError::Storage(_))
        ));
        assert!(normalize_key("a\\b").is_err());
        assert!(normalize_key("//").is_err());
    }
}
