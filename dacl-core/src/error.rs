//! # DACL Error Types
//!
//! Centralized error handling for the device ACL.

use std::path::PathBuf;

use dacl_storage::StorageError;
use thiserror::Error;

/// Result type alias for ACL operations
pub type Result<T> = std::result::Result<T, AclError>;

/// Errors reported by ACL operations
#[derive(Error, Debug)]
pub enum AclError {
    /// No ACL is provisioned on the device
    #[error("ACL not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A zero-length ACL was found and deleted; the device must be re-provisioned
    #[error("Found and removed corrupted ACL at {}. Please try locking again.", .0.display())]
    CorruptedAclRemoved(PathBuf),

    /// Persisted ACL is not valid JSON
    #[error("Invalid ACL format: {0}")]
    InvalidFormat(#[source] serde_json::Error),

    /// Signature does not verify under any accepted message form
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature text could not be decoded
    #[error("Unable to decode signature: {0}")]
    MalformedSignature(String),

    /// A versioned ACL cannot be cleared without a signature
    #[error("ACL on device requires a signature to be cleared")]
    SignatureRequired,

    /// ACL could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Serialization produced no bytes; writing would corrupt the ACL
    #[error("Refusing to write empty ACL to {}", .0.display())]
    EmptySerialization(PathBuf),

    /// The ACL directory could not be created
    #[error("Failed to create ACL directory: {0}")]
    DirectoryCreation(#[source] StorageError),

    /// I/O failure while writing the ACL
    #[error("Failed to write ACL: {0}")]
    Write(#[source] StorageError),

    /// I/O failure while removing the ACL
    #[error("Failed to remove ACL: {0}")]
    Delete(#[source] StorageError),

    /// I/O failure while reading the ACL
    #[error("Failed to read ACL: {0}")]
    Read(#[source] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AclError {
    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Errors after which the current workflow must not continue.
    ///
    /// The caller has to re-provision (or fix the device) and start over;
    /// retrying the same call will not help.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            AclError::CorruptedAclRemoved(_)
                | AclError::EmptySerialization(_)
                | AclError::DirectoryCreation(_)
        )
    }

    /// Errors caused by the supplied proof rather than by the device.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            AclError::InvalidSignature | AclError::MalformedSignature(_) | AclError::SignatureRequired
        )
    }

    pub(crate) fn from_write(err: StorageError) -> Self {
        match err {
            StorageError::DirectoryCreation(..) => AclError::DirectoryCreation(err),
            other => AclError::Write(other),
        }
    }
}
