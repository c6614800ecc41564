//! Provisioning controller - gateway identity lifecycle
//!
//! Prepares and removes one gateway identity:
//! 1. Validate the identity and host preconditions (no side effects)
//! 2. Ensure the library directory exists
//! 3. Ensure the keyring exists, creating it through the auth registry
//! 4. On removal, revoke the identity best-effort and delete the directory
//!
//! There is no stored status. Every call re-inspects the filesystem, which
//! makes both operations idempotent. Check and act are serialized per
//! identity by [`IdentityLock`]; on platforms without `flock(2)` the caller
//! must not run two operations for the same identity concurrently.
//!
//! An existing keyring is never overwritten, even if it is stale.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::binary::ServiceBinary;
use crate::cluster::ceph_base_args;
use crate::error::{ProvisionError, Result};
use crate::identity::ServiceIdentity;
use crate::keyring::{KeyringPaths, LibraryPaths, BOOTSTRAP_PRINCIPAL};
use crate::lock::IdentityLock;
use crate::runner::CommandRunner;

/// Capabilities granted to a gateway identity
const OSD_CAPS: &str = "allow rwx";
const MON_CAPS: &str = "allow rw";

/// Provisioning state as found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProvisionState {
    /// No library directory
    Absent,
    /// Directory present, keyring missing
    DirectoryOnly,
    /// Directory and keyring present
    Provisioned,
}

/// What happened to the registry entry during removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Revocation {
    Revoked,
    /// No keyring on disk, registry left alone
    NotAttempted,
    /// Registry unreachable or refused; the entry may be orphaned
    Failed { error: String },
}

/// Result of `remove()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Removal {
    /// Nothing to remove
    AlreadyAbsent,
    /// Library directory deleted
    Removed { revocation: Revocation },
}

/// Owns prepare/remove for one gateway identity
pub struct ProvisioningController {
    name: String,
    cluster_name: String,
    paths: KeyringPaths,
    binary: ServiceBinary,
    runner: Arc<dyn CommandRunner>,
}

impl ProvisioningController {
    pub fn new(
        name: impl Into<String>,
        cluster_name: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            cluster_name: cluster_name.into(),
            paths: KeyringPaths::default(),
            binary: ServiceBinary::default(),
            runner,
        }
    }

    pub fn with_paths(mut self, paths: KeyringPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_binary(mut self, binary: ServiceBinary) -> Self {
        self.binary = binary;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Library directory and keyring for this identity
    pub fn library_paths(&self) -> Result<LibraryPaths> {
        let identity = ServiceIdentity::parse(&self.name)?;
        Ok(self.paths.library_paths(&self.cluster_name, identity.name()))
    }

    /// Inspect the filesystem without changing anything
    pub fn status(&self) -> Result<ProvisionState> {
        let lib = self.library_paths()?;
        Ok(if !lib.library_dir.is_dir() {
            ProvisionState::Absent
        } else if lib.keyring_path.is_file() {
            ProvisionState::Provisioned
        } else {
            ProvisionState::DirectoryOnly
        })
    }

    /// Ensure the library directory and keyring exist
    pub fn prepare(&self) -> Result<()> {
        let identity = ServiceIdentity::parse(&self.name)?;

        if self.binary.resolve().is_none() {
            return Err(ProvisionError::PreconditionMissing(format!(
                "gateway binary not found: {}",
                self.binary.describe()
            )));
        }

        let lib = self.paths.library_paths(&self.cluster_name, identity.name());
        let bootstrap = self.paths.bootstrap_keyring(&self.cluster_name);
        if !bootstrap.is_file() {
            return Err(ProvisionError::PreconditionMissing(format!(
                "Keyring not found at {}",
                bootstrap.display()
            )));
        }

        let _lock = self.lock(&identity)?;

        if !lib.library_dir.is_dir() {
            info!(identity = %identity, path = %lib.library_dir.display(), "Make missing directory");
            fs::create_dir_all(&lib.library_dir)
                .map_err(|e| ProvisionError::io(lib.library_dir.display(), e))?;
        }

        if lib.keyring_path.is_file() {
            debug!(identity = %identity, path = %lib.keyring_path.display(), "Keyring present");
            return Ok(());
        }

        info!(identity = %identity, path = %lib.keyring_path.display(), "Make missing keyring");
        let keyring = lib.keyring_path.display().to_string();
        let principal = identity.principal();
        let args = self.auth_args(
            &bootstrap,
            &[
                "get-or-create",
                principal.as_str(),
                "osd",
                OSD_CAPS,
                "mon",
                MON_CAPS,
                "-o",
                keyring.as_str(),
            ],
        );

        let output = match self.runner.run(&args) {
            Ok(output) => output,
            Err(e) => {
                rollback_keyring(&lib.keyring_path);
                return Err(e.into());
            }
        };

        if !output.success() {
            rollback_keyring(&lib.keyring_path);
            return Err(ProvisionError::command_failed(&args, &output));
        }

        if !lib.keyring_path.is_file() {
            warn!(identity = %identity, path = %lib.keyring_path.display(), "Registry reported success but wrote no keyring");
        }

        Ok(())
    }

    /// Revoke the identity and delete its library directory.
    ///
    /// Revocation is best-effort: a failure is logged and reported in the
    /// returned [`Removal`], and the directory is deleted regardless.
    pub fn remove(&self) -> Result<Removal> {
        let identity = ServiceIdentity::parse(&self.name)?;
        let lib = self.paths.library_paths(&self.cluster_name, identity.name());
        if !lib.library_dir.is_dir() {
            debug!(identity = %identity, "Library directory absent, nothing to remove");
            return Ok(Removal::AlreadyAbsent);
        }

        let _lock = self.lock(&identity)?;
        if !lib.library_dir.is_dir() {
            return Ok(Removal::AlreadyAbsent);
        }

        let revocation = if lib.keyring_path.is_file() {
            info!(identity = %identity, path = %lib.keyring_path.display(), "Remove from auth list keyring");
            match self.revoke_identity(&identity) {
                Ok(()) => Revocation::Revoked,
                Err(e) => {
                    error!(identity = %identity, error = %e, "Failed to remove from auth list");
                    Revocation::Failed {
                        error: e.to_string(),
                    }
                }
            }
        } else {
            Revocation::NotAttempted
        };

        info!(identity = %identity, path = %lib.library_dir.display(), "Remove directory content");
        fs::remove_dir_all(&lib.library_dir)
            .map_err(|e| ProvisionError::io(lib.library_dir.display(), e))?;

        Ok(Removal::Removed { revocation })
    }

    /// Revoke the identity from the auth registry, failing on non-zero exit.
    ///
    /// Does nothing when the library directory is absent.
    pub fn revoke(&self) -> Result<()> {
        let identity = ServiceIdentity::parse(&self.name)?;
        let lib = self.paths.library_paths(&self.cluster_name, identity.name());
        if !lib.library_dir.is_dir() {
            return Ok(());
        }

        let _lock = self.lock(&identity)?;
        self.revoke_identity(&identity)
    }

    fn revoke_identity(&self, identity: &ServiceIdentity) -> Result<()> {
        let bootstrap = self.paths.bootstrap_keyring(&self.cluster_name);
        let principal = identity.principal();
        let args = self.auth_args(&bootstrap, &["del", principal.as_str()]);

        let output = self.runner.run(&args)?;
        if !output.success() {
            return Err(ProvisionError::command_failed(&args, &output));
        }
        Ok(())
    }

    /// `ceph ... --name client.bootstrap-rgw --keyring <bootstrap> auth <tail>`
    fn auth_args(&self, bootstrap: &Path, tail: &[&str]) -> Vec<String> {
        let mut args = ceph_base_args(&self.cluster_name, Some(BOOTSTRAP_PRINCIPAL), Some(bootstrap));
        args.push("auth".to_string());
        args.extend(tail.iter().map(|s| s.to_string()));
        args
    }

    fn lock(&self, identity: &ServiceIdentity) -> Result<IdentityLock> {
        let root = self.paths.lib_root();
        fs::create_dir_all(root).map_err(|e| ProvisionError::io(root.display(), e))?;
        IdentityLock::acquire(&self.paths.lock_path(&self.cluster_name, identity.name()))
    }
}

/// Delete a keyring left behind by a failed registry call
fn rollback_keyring(path: &Path) {
    if !path.is_file() {
        return;
    }
    info!(path = %path.display(), "Cleaning up new key");
    if let Err(e) = fs::remove_file(path) {
        error!(path = %path.display(), error = %e, "Failed to clean up new key");
    }
}
