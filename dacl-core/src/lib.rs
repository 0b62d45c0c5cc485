//! # DACL Core
//!
//! Signature-authorized access control list for a device.
//!
//! The ACL names *managers*, who may change or clear it, and *drivers*, who
//! may operate the device. The list authorizes itself: a new ACL must be
//! signed by one of its own managers, and clearing requires a signature from
//! a manager of the ACL currently stored.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dacl_core::{AclGateway, AclRecord};
//!
//! # fn example(signature_b58: &str) -> dacl_core::Result<()> {
//! let gateway = AclGateway::filesystem();
//! let root = Path::new("/data/device");
//!
//! let acl = AclRecord::new(["<manager key>"], ["<driver key>"]).with_fleet_name("fleet1");
//! gateway.store_with_text(root, &acl, signature_b58)?;
//! assert_eq!(gateway.load(root)?, acl);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod canonical;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod record;

pub use auth::{
    clear_message, legacy_store_message, store_message, AclAuthorizer, MessageFormat,
    CLEAR_MESSAGE_FORMATS, STORE_MESSAGE_FORMATS,
};
pub use config::{AclConfig, ConfigLoader};
pub use error::{AclError, Result};
pub use gateway::{acl_path, AclGateway, ACL_FILE_NAME};
pub use identity::{Ed25519Base58, IdentityError, IdentityScheme, PublicKey, Signature};
pub use record::{AclRecord, AclSummary, CURRENT_VERSION};
