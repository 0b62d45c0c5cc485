//! # ACL Record
//!
//! The persisted list of managers (who may change the ACL) and drivers
//! (who may operate the device).

use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical;
use crate::error::{AclError, Result};

/// Version tag written by current provisioning tools.
pub const CURRENT_VERSION: &str = "1";

/// Access control list for one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRecord {
    /// Empty for legacy ACLs
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub version: String,

    /// Base58 public keys allowed to change this ACL
    #[serde(default, deserialize_with = "null_as_empty")]
    pub managers: Vec<String>,

    /// Base58 public keys allowed to operate the device
    #[serde(default, deserialize_with = "null_as_empty")]
    pub drivers: Vec<String>,

    #[serde(
        rename = "fleetName",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub fleet_name: String,
}

// `null` reads as the zero value, for strings, lists and list items alike.
fn null_as_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Option<String>>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

impl AclRecord {
    /// Create an unversioned ACL without a fleet
    pub fn new<M, D>(managers: M, drivers: D) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            version: String::new(),
            managers: managers.into_iter().map(Into::into).collect(),
            drivers: drivers.into_iter().map(Into::into).collect(),
            fleet_name: String::new(),
        }
    }

    /// Set fleet name
    pub fn with_fleet_name(mut self, fleet_name: impl Into<String>) -> Self {
        self.fleet_name = fleet_name.into();
        self
    }

    /// Set version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Parse an ACL from its persisted JSON form
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(AclError::InvalidFormat)
    }

    /// Serialize to the persisted JSON form
    pub fn to_canonical_json(&self) -> Result<Vec<u8>> {
        canonical::to_vec(self).map_err(AclError::Serialization)
    }

    /// Versioned ACLs need a signature even to be cleared.
    pub fn is_versioned(&self) -> bool {
        !self.version.is_empty()
    }

    /// An ACL without managers can never be changed again.
    pub fn has_managers(&self) -> bool {
        !self.managers.is_empty()
    }

    pub fn is_manager(&self, identity: &str) -> bool {
        self.managers.iter().any(|m| m == identity)
    }

    pub fn is_driver(&self, identity: &str) -> bool {
        self.drivers.iter().any(|d| d == identity)
    }

    /// Get summary
    pub fn summary(&self) -> AclSummary {
        AclSummary {
            version: self.version.clone(),
            fleet_name: self.fleet_name.clone(),
            manager_count: self.managers.len(),
            driver_count: self.drivers.len(),
        }
    }
}

/// ACL summary for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclSummary {
    pub version: String,
    pub fleet_name: String,
    pub manager_count: usize,
    pub driver_count: usize,
}
