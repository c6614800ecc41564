//! Provisioner configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::keyring::{KeyringPaths, DEFAULT_BOOTSTRAP_DIR, DEFAULT_LIB_ROOT};
use crate::runner::host::DEFAULT_HOST_AGENT;
use crate::runner::RunnerBackend;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster name, selects `/etc/ceph/<name>.conf` and the bootstrap keyring
    #[serde(default = "default_cluster_name")]
    pub name: String,

    /// Principal used for pool listing and creation
    #[serde(default = "default_admin_name")]
    pub admin_name: String,

    /// Keyring for `admin_name` (optional, ceph's default lookup otherwise)
    #[serde(default)]
    pub admin_keyring: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of per-gateway library directories
    #[serde(default = "default_lib_root")]
    pub lib_root: PathBuf,

    /// Directory holding `<cluster>.keyring` bootstrap credentials
    #[serde(default = "default_bootstrap_dir")]
    pub bootstrap_dir: PathBuf,

    /// Gateway binary (optional, searched on PATH otherwise)
    #[serde(default)]
    pub service_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Command execution backend
    #[serde(default)]
    pub backend: RunnerBackend,

    /// Agent program for the host backend
    #[serde(default = "default_host_agent")]
    pub host_agent: String,
}

// Defaults
fn default_cluster_name() -> String { "ceph".to_string() }
fn default_admin_name() -> String { "client.admin".to_string() }
fn default_lib_root() -> PathBuf { PathBuf::from(DEFAULT_LIB_ROOT) }
fn default_bootstrap_dir() -> PathBuf { PathBuf::from(DEFAULT_BOOTSTRAP_DIR) }
fn default_host_agent() -> String { DEFAULT_HOST_AGENT.to_string() }

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            admin_name: default_admin_name(),
            admin_keyring: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            lib_root: default_lib_root(),
            bootstrap_dir: default_bootstrap_dir(),
            service_bin: None,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            backend: RunnerBackend::default(),
            host_agent: default_host_agent(),
        }
    }
}

/// Config loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn keyring_paths(&self) -> KeyringPaths {
        KeyringPaths::new(self.paths.lib_root.clone(), self.paths.bootstrap_dir.clone())
    }
}
