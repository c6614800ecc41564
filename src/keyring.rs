//! Keyring path conventions
//!
//! Directory structure:
//!   /var/lib/ceph/radosgw/
//!     ├── ceph-rgw.gateway1/
//!     │   └── keyring            # Derived gateway credential
//!     └── .ceph-rgw.gateway1.lock
//!   /var/lib/ceph/bootstrap-rgw/
//!     └── ceph.keyring           # Bootstrap credential, one per cluster

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Default root for gateway library directories
pub const DEFAULT_LIB_ROOT: &str = "/var/lib/ceph/radosgw";

/// Default directory holding per-cluster bootstrap keyrings
pub const DEFAULT_BOOTSTRAP_DIR: &str = "/var/lib/ceph/bootstrap-rgw";

/// Registry principal that owns the bootstrap keyring
pub const BOOTSTRAP_PRINCIPAL: &str = "client.bootstrap-rgw";

/// File name of the derived keyring inside a library directory
pub const KEYRING_FILE: &str = "keyring";

/// Library directory and keyring file for one gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryPaths {
    pub library_dir: PathBuf,
    pub keyring_path: PathBuf,
}

/// Filesystem conventions for credential storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyringPaths {
    lib_root: PathBuf,
    bootstrap_dir: PathBuf,
}

impl KeyringPaths {
    pub fn new(lib_root: impl Into<PathBuf>, bootstrap_dir: impl Into<PathBuf>) -> Self {
        Self {
            lib_root: lib_root.into(),
            bootstrap_dir: bootstrap_dir.into(),
        }
    }

    pub fn lib_root(&self) -> &Path {
        &self.lib_root
    }

    /// `<lib_root>/<cluster>-<service>/` and its `keyring`
    pub fn library_paths(&self, cluster_name: &str, service_name: &str) -> LibraryPaths {
        let library_dir = self
            .lib_root
            .join(format!("{}-{}", cluster_name, service_name));
        let keyring_path = library_dir.join(KEYRING_FILE);
        LibraryPaths {
            library_dir,
            keyring_path,
        }
    }

    /// Bootstrap keyring for the cluster
    pub fn bootstrap_keyring(&self, cluster_name: &str) -> PathBuf {
        self.bootstrap_dir.join(format!("{}.keyring", cluster_name))
    }

    /// Lock file guarding one identity, kept beside the library directory
    pub fn lock_path(&self, cluster_name: &str, service_name: &str) -> PathBuf {
        self.lib_root
            .join(format!(".{}-{}.lock", cluster_name, service_name))
    }
}

impl Default for KeyringPaths {
    fn default() -> Self {
        Self::new(DEFAULT_LIB_ROOT, DEFAULT_BOOTSTRAP_DIR)
    }
}
