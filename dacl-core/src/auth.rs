//! # ACL Authorization
//!
//! Builds the exact messages managers sign and checks signatures against
//! them. Message bytes are shared with external signing tools and must be
//! reproduced exactly.
//!
//! Storing accepts two message formats, tried in order:
//!
//! 1. `current`: a summary line carrying the MD5 of the fleet name, managers
//!    and drivers.
//! 2. `legacy`: the raw JSON of managers and drivers. ACLs signed before fleet
//!    names existed keep validating through this format.
//!
//! Clearing only has one format.

use serde::Serialize;
use tracing::{debug, warn};

use crate::canonical;
use crate::error::{AclError, Result};
use crate::identity::{Ed25519Base58, IdentityScheme};
use crate::record::AclRecord;

/// Prefix of the message signed to clear an ACL
pub const CLEAR_MESSAGE_PREFIX: &str = "Clearing Access Control List for fleet ";

/// Builds the bytes to sign for one message format
pub type MessageBuilder = fn(&AclRecord) -> Result<Vec<u8>>;

/// A named message format
#[derive(Clone, Copy)]
pub struct MessageFormat {
    pub name: &'static str,
    pub build: MessageBuilder,
}

/// Formats accepted for storing, in the order they are tried
pub const STORE_MESSAGE_FORMATS: &[MessageFormat] = &[
    MessageFormat { name: "current", build: store_message },
    MessageFormat { name: "legacy", build: legacy_store_message },
];

/// Formats accepted for clearing
pub const CLEAR_MESSAGE_FORMATS: &[MessageFormat] = &[
    MessageFormat { name: "clear", build: clear_message },
];

#[derive(Serialize)]
struct HashableAcl<'a> {
    #[serde(rename = "fleetName", skip_serializing_if = "Option::is_none")]
    fleet_name: Option<&'a str>,
    managers: &'a [String],
    drivers: &'a [String],
}

#[derive(Serialize)]
struct LegacyHashableAcl<'a> {
    managers: &'a [String],
    drivers: &'a [String],
}

/// Message a manager signs to clear the ACL
pub fn clear_message(record: &AclRecord) -> Result<Vec<u8>> {
    Ok(format!("{}{}", CLEAR_MESSAGE_PREFIX, record.fleet_name).into_bytes())
}

/// Message a manager signs to store `record`
pub fn store_message(record: &AclRecord) -> Result<Vec<u8>> {
    let hashable = HashableAcl {
        fleet_name: Some(record.fleet_name.as_str()).filter(|f| !f.is_empty()),
        managers: &record.managers,
        drivers: &record.drivers,
    };
    let data = canonical::to_vec(&hashable).map_err(AclError::Serialization)?;
    let hash = hex::encode(md5::compute(&data).0);

    Ok(format!(
        "Access Control List with {} manager(s) and {} driver(s). Hash: {}",
        record.managers.len(),
        record.drivers.len(),
        hash
    )
    .into_bytes())
}

/// Pre-fleet-name store message: the JSON itself, unhashed
pub fn legacy_store_message(record: &AclRecord) -> Result<Vec<u8>> {
    let hashable = LegacyHashableAcl {
        managers: &record.managers,
        drivers: &record.drivers,
    };
    canonical::to_vec(&hashable).map_err(AclError::Serialization)
}

/// Checks manager signatures over ACL messages
#[derive(Debug, Clone, Default)]
pub struct AclAuthorizer<S = Ed25519Base58> {
    scheme: S,
}

impl<S: IdentityScheme> AclAuthorizer<S> {
    pub fn new(scheme: S) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    /// True if a manager of `record` signed one of the store formats
    pub fn validate_store_signature(&self, record: &AclRecord, signature: &S::Signature) -> bool {
        self.validate_formats(STORE_MESSAGE_FORMATS, record, signature)
    }

    /// True if a manager of `record` signed the clear message
    pub fn validate_clear_signature(&self, record: &AclRecord, signature: &S::Signature) -> bool {
        self.validate_formats(CLEAR_MESSAGE_FORMATS, record, signature)
    }

    fn validate_formats(
        &self,
        formats: &[MessageFormat],
        record: &AclRecord,
        signature: &S::Signature,
    ) -> bool {
        for format in formats {
            let message = match (format.build)(record) {
                Ok(message) => message,
                Err(e) => {
                    warn!(format = format.name, error = %e, "Failed to build ACL message");
                    return false;
                }
            };
            if self.validate_signature(&message, signature, &record.managers) {
                debug!(format = format.name, "ACL signature verified");
                return true;
            }
        }
        false
    }

    /// True if any manager's key verifies `signature` over `message`.
    ///
    /// Managers are tried in order. The first identity that fails to parse
    /// ends the check with `false`, even when a later manager would verify.
    pub fn validate_signature(
        &self,
        message: &[u8],
        signature: &S::Signature,
        managers: &[String],
    ) -> bool {
        for manager in managers {
            let key = match self.scheme.parse_public_key(manager) {
                Ok(key) => key,
                Err(e) => {
                    warn!(manager = %manager, error = %e, "Malformed manager identity in ACL");
                    return false;
                }
            };
            if self.scheme.verify(&key, message, signature) {
                return true;
            }
        }
        false
    }
}
