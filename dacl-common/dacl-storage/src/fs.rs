//! Filesystem blob store.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::blob::BlobStore;
use crate::error::StorageError;

/// Stores each blob as a plain file at its path.
#[derive(Debug, Clone, Default)]
pub struct FsBlobStore;

impl FsBlobStore {
    pub fn new() -> Self {
        Self
    }
}

impl BlobStore for FsBlobStore {
    fn name(&self) -> &str {
        "fs"
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
            _ => StorageError::Io(path.to_path_buf(), e),
        })
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::DirectoryCreation(parent.to_path_buf(), e))?;
        }

        // Write a sibling file and rename it over the target, so a failed
        // write never leaves a truncated blob behind.
        let tmp_path = temp_path_for(path);
        if let Err(e) = write_synced(&tmp_path, data) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StorageError::Io(path.to_path_buf(), e));
        }
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StorageError::Io(path.to_path_buf(), e)
        })?;
        sync_parent(path);
        Ok(())
    }

    fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(path.to_path_buf(), e)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        // Anything but "not found" counts as present, so a blob we cannot
        // stat is never mistaken for an unprovisioned device.
        match fs::metadata(path) {
            Ok(_) => true,
            Err(e) => e.kind() != ErrorKind::NotFound,
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Persists the rename itself. Best effort: not every platform can open a
/// directory for syncing.
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
