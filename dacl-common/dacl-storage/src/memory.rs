use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::blob::BlobStore;
use crate::error::StorageError;

/// How the next `write` should fail, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Fail before touching the stored blob.
    BeforeWrite,
    /// Truncate the blob to zero bytes, then fail (a torn write).
    AfterTruncate,
}

/// In-memory blob store for tests and embedding.
pub struct MemoryBlobStore {
    data: RwLock<HashMap<PathBuf, Vec<u8>>>,
    next_failure: Mutex<Option<InjectedFailure>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            next_failure: Mutex::new(None),
        }
    }

    /// Makes the next `write` fail in the given way.
    pub fn fail_next_write(&self, failure: InjectedFailure) {
        *self.next_failure.lock() = Some(failure);
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.data
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let failure = self.next_failure.lock().take();
        let mut blobs = self.data.write();
        match failure {
            Some(InjectedFailure::BeforeWrite) => Err(StorageError::Io(
                path.to_path_buf(),
                io::Error::new(io::ErrorKind::Other, "injected write failure"),
            )),
            Some(InjectedFailure::AfterTruncate) => {
                blobs.insert(path.to_path_buf(), Vec::new());
                Err(StorageError::Io(
                    path.to_path_buf(),
                    io::Error::new(io::ErrorKind::WriteZero, "injected torn write"),
                ))
            }
            None => {
                blobs.insert(path.to_path_buf(), data.to_vec());
                Ok(())
            }
        }
    }

    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.data.write().remove(path).is_some())
    }

    fn exists(&self, path: &Path) -> bool {
        self.data.read().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let store = MemoryBlobStore::new();
        let path = Path::new("/device/acl.data");

        assert!(!store.exists(path));
        store.write(path, b"payload").unwrap();
        assert!(store.exists(path));
        assert_eq!(store.read(path).unwrap(), b"payload");
        assert!(store.delete(path).unwrap());
        assert!(store.read(path).unwrap_err().is_not_found());
    }

    #[test]
    fn test_injected_torn_write_leaves_empty_blob() {
        let store = MemoryBlobStore::new();
        let path = Path::new("/device/acl.data");
        store.write(path, b"previous").unwrap();

        store.fail_next_write(InjectedFailure::AfterTruncate);
        assert!(store.write(path, b"next").is_err());
        assert_eq!(store.read(path).unwrap(), Vec::<u8>::new());

        // Only one write is affected.
        store.write(path, b"next").unwrap();
        assert_eq!(store.read(path).unwrap(), b"next");
    }

    #[test]
    fn test_injected_failure_before_write_keeps_content() {
        let store = MemoryBlobStore::new();
        let path = Path::new("/device/acl.data");
        store.write(path, b"previous").unwrap();

        store.fail_next_write(InjectedFailure::BeforeWrite);
        assert!(store.write(path, b"next").is_err());
        assert_eq!(store.read(path).unwrap(), b"previous");
    }
}
