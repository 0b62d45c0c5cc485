//! # ACL Persistence
//!
//! Reads and writes the single ACL blob of a device, checking manager
//! signatures before any change.
//!
//! Every operation that touches the blob holds a per-device lock, so two
//! authorized callers cannot interleave a read of the current managers with
//! someone else's write. Lock keys are absolute roots with `.` components
//! removed, so `dev` and `./dev` share a lock. Symlinks and `..` are not
//! resolved. A lock entry is dropped once no operation holds it.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dacl_storage::{BlobStore, FsBlobStore, StorageError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::auth::AclAuthorizer;
use crate::error::{AclError, Result};
use crate::identity::{Ed25519Base58, IdentityScheme};
use crate::record::AclRecord;

/// Name of the ACL blob inside a device root
pub const ACL_FILE_NAME: &str = "acl.data";

/// Location of the ACL blob for `root`
pub fn acl_path(root: &Path) -> PathBuf {
    root.join(ACL_FILE_NAME)
}

/// Loads, stores and clears device ACLs
pub struct AclGateway<B = FsBlobStore, S = Ed25519Base58> {
    store: B,
    authorizer: AclAuthorizer<S>,
    device_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AclGateway<FsBlobStore, Ed25519Base58> {
    /// Gateway over the local filesystem with Base58 Ed25519 identities
    pub fn filesystem() -> Self {
        Self::new(FsBlobStore::new(), Ed25519Base58)
    }
}

impl<B: BlobStore, S: IdentityScheme> AclGateway<B, S> {
    pub fn new(store: B, scheme: S) -> Self {
        Self {
            store,
            authorizer: AclAuthorizer::new(scheme),
            device_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn blob_store(&self) -> &B {
        &self.store
    }

    pub fn authorizer(&self) -> &AclAuthorizer<S> {
        &self.authorizer
    }

    /// Runs `f` while holding the lock of the device at `root`.
    fn with_device_lock<T>(&self, root: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let key = lock_key(root);
        let lock = self
            .device_locks
            .lock()
            .entry(key.clone())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock();
            f()
        };

        // Clones are only taken under the table lock, so a count of two (the
        // table and `lock`) means nobody else is waiting on this device.
        let mut locks = self.device_locks.lock();
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }
        result
    }

    /// Load the ACL stored under `root`.
    ///
    /// A zero-length blob is left over from an interrupted write. It is
    /// deleted and reported as [`AclError::CorruptedAclRemoved`]; the device
    /// has to be provisioned again.
    pub fn load(&self, root: &Path) -> Result<AclRecord> {
        self.with_device_lock(root, || self.load_locked(root))
    }

    fn load_locked(&self, root: &Path) -> Result<AclRecord> {
        let path = acl_path(root);
        let data = self.store.read(&path).map_err(|e| match e {
            StorageError::NotFound(p) => AclError::NotFound(p),
            other => AclError::Read(other),
        })?;

        if data.is_empty() {
            error!(path = %path.display(), "Found zero-length ACL, removing it");
            self.store.delete(&path).map_err(AclError::Delete)?;
            return Err(AclError::CorruptedAclRemoved(path));
        }

        AclRecord::from_slice(&data)
    }

    /// Whether an ACL is provisioned under `root`
    pub fn exists(&self, root: &Path) -> bool {
        self.store.exists(&acl_path(root))
    }

    /// Store `record` under `root`, replacing any previous ACL.
    ///
    /// `signature` must come from one of the managers listed in `record`
    /// itself, over either accepted store message.
    pub fn store(&self, root: &Path, record: &AclRecord, signature: &S::Signature) -> Result<()> {
        let path = acl_path(root);
        if !self.authorizer.validate_store_signature(record, signature) {
            warn!(path = %path.display(), "Rejected ACL store: invalid signature");
            return Err(AclError::InvalidSignature);
        }

        let data = record.to_canonical_json()?;
        if data.is_empty() {
            error!(path = %path.display(), "ACL serialized to nothing, refusing to write");
            return Err(AclError::EmptySerialization(path));
        }

        self.with_device_lock(root, || {
            self.store.write(&path, &data).map_err(AclError::from_write)
        })?;

        info!(
            path = %path.display(),
            managers = record.managers.len(),
            drivers = record.drivers.len(),
            fleet = %record.fleet_name,
            "Stored ACL"
        );
        Ok(())
    }

    /// Like [`store`](Self::store), with the signature in its text encoding
    pub fn store_with_text(&self, root: &Path, record: &AclRecord, signature: &str) -> Result<()> {
        let signature = self
            .authorizer
            .scheme()
            .parse_signature(signature)
            .map_err(|e| AclError::MalformedSignature(e.to_string()))?;
        self.store(root, record, &signature)
    }

    /// Remove the ACL under `root`.
    ///
    /// Succeeds without doing anything when no ACL exists. An empty
    /// `signature` is accepted only for unversioned (legacy) ACLs; otherwise
    /// it must be a manager's signature over the clear message of the ACL
    /// currently stored.
    pub fn clear(&self, root: &Path, signature: &str) -> Result<()> {
        self.with_device_lock(root, || self.clear_locked(root, signature))
    }

    fn clear_locked(&self, root: &Path, signature: &str) -> Result<()> {
        let path = acl_path(root);
        if !self.store.exists(&path) {
            debug!(path = %path.display(), "No ACL to clear");
            return Ok(());
        }

        let current = self.load_locked(root)?;

        if signature.is_empty() {
            if current.is_versioned() {
                warn!(path = %path.display(), "Rejected ACL clear: signature required");
                return Err(AclError::SignatureRequired);
            }
            warn!(path = %path.display(), "Clearing legacy ACL without signature");
        } else {
            let signature = self
                .authorizer
                .scheme()
                .parse_signature(signature)
                .map_err(|e| AclError::MalformedSignature(e.to_string()))?;
            if !self.authorizer.validate_clear_signature(&current, &signature) {
                warn!(path = %path.display(), "Rejected ACL clear: invalid signature");
                return Err(AclError::InvalidSignature);
            }
        }

        self.store.delete(&path).map_err(AclError::Delete)?;
        info!(path = %path.display(), fleet = %current.fleet_name, "Cleared ACL");
        Ok(())
    }
}

/// Absolute form of `root` without `.` components
fn lock_key(root: &Path) -> PathBuf {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(root),
            Err(_) => root.to_path_buf(),
        }
    };
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{clear_message, legacy_store_message, store_message};
    use crate::identity::testing::TestSigner;
    use crate::record::CURRENT_VERSION;
    use dacl_storage::{InjectedFailure, MemoryBlobStore};

    fn gateway() -> AclGateway<MemoryBlobStore> {
        AclGateway::new(MemoryBlobStore::new(), Ed25519Base58)
    }

    fn root() -> &'static Path {
        Path::new("/devices/hdc-1")
    }

    fn provision(gw: &AclGateway<MemoryBlobStore>, signer: &TestSigner, acl: &AclRecord) {
        let signature = signer.sign(&store_message(acl).unwrap());
        gw.store(root(), acl, &signature).unwrap();
    }

    #[test]
    fn test_store_then_load() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], ["driver-a"])
            .with_version(CURRENT_VERSION)
            .with_fleet_name("fleet1");

        provision(&gw, &manager, &acl);

        assert!(gw.exists(root()));
        assert_eq!(gw.load(root()).unwrap(), acl);
    }

    #[test]
    fn test_store_with_legacy_signature() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], ["driver-a"]);
        let signature = manager.sign(&legacy_store_message(&acl).unwrap());

        gw.store(root(), &acl, &signature).unwrap();
        assert_eq!(gw.load(root()).unwrap(), acl);
    }

    #[test]
    fn test_store_rejects_unrelated_signer_without_writing() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let outsider = TestSigner::from_seed(2);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new()).with_fleet_name("fleet1");

        let err = gw
            .store(root(), &acl, &outsider.sign(&store_message(&acl).unwrap()))
            .unwrap_err();

        assert!(matches!(err, AclError::InvalidSignature));
        assert!(!gw.exists(root()));
    }

    #[test]
    fn test_store_with_text_rejects_undecodable_signature() {
        let gw = gateway();
        let acl = AclRecord::new([TestSigner::from_seed(1).identity()], Vec::<String>::new());

        let err = gw.store_with_text(root(), &acl, "not a signature").unwrap_err();
        assert!(matches!(err, AclError::MalformedSignature(_)));
    }

    #[test]
    fn test_load_missing_is_not_found() {
        assert!(matches!(gateway().load(root()), Err(AclError::NotFound(_))));
    }

    #[test]
    fn test_load_zero_length_removes_blob() {
        let gw = gateway();
        gw.blob_store().write(&acl_path(root()), b"").unwrap();

        let err = gw.load(root()).unwrap_err();
        assert!(matches!(err, AclError::CorruptedAclRemoved(_)));
        assert!(err.is_unrecoverable());
        assert!(!gw.exists(root()));
        // Second attempt sees an unprovisioned device
        assert!(matches!(gw.load(root()), Err(AclError::NotFound(_))));
    }

    #[test]
    fn test_load_garbage_is_invalid_format() {
        let gw = gateway();
        gw.blob_store().write(&acl_path(root()), b"{\"managers\":").unwrap();
        assert!(matches!(gw.load(root()), Err(AclError::InvalidFormat(_))));
        // Unlike a zero-length blob, garbage is left in place
        assert!(gw.exists(root()));
    }

    #[test]
    fn test_torn_write_is_recovered_on_next_load() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new());
        provision(&gw, &manager, &acl);

        gw.blob_store().fail_next_write(InjectedFailure::AfterTruncate);
        let signature = manager.sign(&store_message(&acl).unwrap());
        let err = gw.store(root(), &acl, &signature).unwrap_err();
        assert!(matches!(err, AclError::Write(_)));

        assert!(matches!(gw.load(root()), Err(AclError::CorruptedAclRemoved(_))));
        assert!(!gw.exists(root()));
    }

    #[test]
    fn test_clear_without_acl_is_noop() {
        let gw = gateway();
        gw.clear(root(), "").unwrap();
        gw.clear(root(), "anything").unwrap();
    }

    #[test]
    fn test_clear_versioned_requires_signature() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new()).with_version("1");
        provision(&gw, &manager, &acl);

        assert!(matches!(gw.clear(root(), ""), Err(AclError::SignatureRequired)));
        assert!(gw.exists(root()));
    }

    #[test]
    fn test_clear_legacy_without_signature() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new());
        provision(&gw, &manager, &acl);

        gw.clear(root(), "").unwrap();
        assert!(!gw.exists(root()));
    }

    #[test]
    fn test_clear_with_manager_signature() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new())
            .with_version("1")
            .with_fleet_name("fleet1");
        provision(&gw, &manager, &acl);

        let signature = manager.sign(&clear_message(&acl).unwrap()).to_string();
        gw.clear(root(), &signature).unwrap();
        assert!(!gw.exists(root()));
    }

    #[test]
    fn test_clear_checks_stored_managers_not_candidate() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let intruder = TestSigner::from_seed(7);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new())
            .with_version("1")
            .with_fleet_name("fleet1");
        provision(&gw, &manager, &acl);

        let forged = intruder.sign(&clear_message(&acl).unwrap()).to_string();
        assert!(matches!(gw.clear(root(), &forged), Err(AclError::InvalidSignature)));
        assert!(gw.exists(root()));
    }

    #[test]
    fn test_clear_rejects_signature_for_other_fleet() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new()).with_fleet_name("north");
        provision(&gw, &manager, &acl);

        let other = acl.clone().with_fleet_name("south");
        let signature = manager.sign(&clear_message(&other).unwrap()).to_string();
        assert!(matches!(gw.clear(root(), &signature), Err(AclError::InvalidSignature)));
    }

    #[test]
    fn test_clear_rejects_undecodable_signature() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new()).with_version("1");
        provision(&gw, &manager, &acl);

        assert!(matches!(
            gw.clear(root(), "0OIl"),
            Err(AclError::MalformedSignature(_))
        ));
    }

    #[test]
    fn test_clear_zero_length_reports_corruption() {
        let gw = gateway();
        gw.blob_store().write(&acl_path(root()), b"").unwrap();

        assert!(matches!(gw.clear(root(), ""), Err(AclError::CorruptedAclRemoved(_))));
        assert!(!gw.exists(root()));
    }

    #[test]
    fn test_lock_key_ignores_current_dir_components() {
        assert_eq!(lock_key(Path::new("dev")), lock_key(Path::new("./dev")));
        assert_eq!(lock_key(Path::new("dev")), lock_key(Path::new("dev/./")));
        assert_eq!(
            lock_key(Path::new("/devices/./hdc-1")),
            PathBuf::from("/devices/hdc-1")
        );
        assert!(lock_key(Path::new("dev")).is_absolute());
        assert_ne!(lock_key(Path::new("dev")), lock_key(Path::new("other")));
    }

    #[test]
    fn test_lock_table_does_not_grow() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new());

        for i in 0..16 {
            let root = PathBuf::from(format!("/devices/hdc-{}", i));
            let signature = manager.sign(&store_message(&acl).unwrap());
            gw.store(&root, &acl, &signature).unwrap();
            gw.load(&root).unwrap();
            gw.clear(&root, "").unwrap();
        }
        let _ = gw.load(Path::new("/devices/missing"));

        assert!(gw.device_locks.lock().is_empty());
    }

    #[test]
    fn test_devices_are_independent() {
        let gw = gateway();
        let manager = TestSigner::from_seed(1);
        let acl = AclRecord::new([manager.identity()], Vec::<String>::new());
        provision(&gw, &manager, &acl);

        let other_root = Path::new("/devices/hdc-2");
        assert!(!gw.exists(other_root));
        gw.clear(other_root, "").unwrap();
        assert!(gw.exists(root()));
    }
}
