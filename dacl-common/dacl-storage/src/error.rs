use std::error::Error;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StorageError {
    NotFound(PathBuf),
    DirectoryCreation(PathBuf, std::io::Error),
    Io(PathBuf, std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "Blob not found: {}", p.display()),
            StorageError::DirectoryCreation(p, e) => {
                write!(f, "Failed to create directory {}: {}", p.display(), e)
            }
            StorageError::Io(p, e) => write!(f, "IO error on {}: {}", p.display(), e),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::NotFound(_) => None,
            StorageError::DirectoryCreation(_, e) | StorageError::Io(_, e) => Some(e),
        }
    }
}
