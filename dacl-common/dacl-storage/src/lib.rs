//! # DACL Storage
//!
//! Durable blob storage used by the device ACL. A blob is addressed by its
//! full path (device root joined with the blob name).

pub mod blob;
pub mod error;
pub mod fs;
#[cfg(feature = "memory")]
pub mod memory;

pub use blob::BlobStore;
pub use error::StorageError;
pub use fs::FsBlobStore;
#[cfg(feature = "memory")]
pub use memory::{InjectedFailure, MemoryBlobStore};
