use std::path::Path;

use crate::error::StorageError;

/// Durable key-value blob store.
///
/// A completed `write` must be durable before it returns; readers observe
/// either the previous content or the full new content, except when the
/// write itself fails part way.
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &str;

    /// Reads the whole blob. Fails with [`StorageError::NotFound`] when absent.
    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Replaces the blob with `data`, creating parent directories as needed.
    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Removes the blob. Returns `false` if there was nothing to remove.
    fn delete(&self, path: &Path) -> Result<bool, StorageError>;

    fn exists(&self, path: &Path) -> bool;
}
