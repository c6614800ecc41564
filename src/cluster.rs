//! Cluster connection - pool listing and creation
//!
//! The reconciler only needs three things from the cluster: can we reach it,
//! which pools exist, and create a pool. [`CephCli`] answers them through the
//! `ceph` command line using the injected [`CommandRunner`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ProvisionError;
use crate::runner::CommandRunner;

/// Connect timeout passed to every cluster-facing command, in seconds
pub const CONNECT_TIMEOUT_SECS: u32 = 5;

/// Control-plane CLI program
pub const CEPH_PROGRAM: &str = "ceph";

/// What the pool reconciler consumes from the cluster
pub trait ClusterConnection {
    /// Establish (or probe) connectivity
    fn connect(&mut self) -> bool;

    /// Names of every pool currently in the cluster
    fn list_pools(&mut self) -> Result<Vec<String>, ProvisionError>;

    /// Create a pool. `Ok(false)` means the cluster declined without an error.
    fn add_pool(&mut self, name: &str, pg_num: u32) -> Result<bool, ProvisionError>;
}

impl<T: ClusterConnection + ?Sized> ClusterConnection for &mut T {
    fn connect(&mut self) -> bool {
        (**self).connect()
    }

    fn list_pools(&mut self) -> Result<Vec<String>, ProvisionError> {
        (**self).list_pools()
    }

    fn add_pool(&mut self, name: &str, pg_num: u32) -> Result<bool, ProvisionError> {
        (**self).add_pool(name, pg_num)
    }
}

/// Common `ceph` prefix: timeout, cluster and optional credentials
pub fn ceph_base_args(
    cluster_name: &str,
    principal: Option<&str>,
    keyring: Option<&Path>,
) -> Vec<String> {
    let mut args = vec![
        CEPH_PROGRAM.to_string(),
        "--connect-timeout".to_string(),
        CONNECT_TIMEOUT_SECS.to_string(),
        "--cluster".to_string(),
        cluster_name.to_string(),
    ];
    if let Some(principal) = principal {
        args.push("--name".to_string());
        args.push(principal.to_string());
    }
    if let Some(keyring) = keyring {
        args.push("--keyring".to_string());
        args.push(keyring.display().to_string());
    }
    args
}

/// Cluster connection backed by the `ceph` CLI
pub struct CephCli {
    runner: Arc<dyn CommandRunner>,
    cluster_name: String,
    principal: Option<String>,
    keyring: Option<PathBuf>,
    connected: bool,
}

impl CephCli {
    pub fn new(runner: Arc<dyn CommandRunner>, cluster_name: impl Into<String>) -> Self {
        Self {
            runner,
            cluster_name: cluster_name.into(),
            principal: None,
            keyring: None,
            connected: false,
        }
    }

    /// Authenticate as `principal`, optionally with an explicit keyring
    pub fn with_credentials(mut self, principal: impl Into<String>, keyring: Option<PathBuf>) -> Self {
        self.principal = Some(principal.into());
        self.keyring = keyring;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn args(&self, tail: &[&str]) -> Vec<String> {
        let mut args = ceph_base_args(
            &self.cluster_name,
            self.principal.as_deref(),
            self.keyring.as_deref(),
        );
        args.extend(tail.iter().map(|s| s.to_string()));
        args
    }
}

impl ClusterConnection for CephCli {
    fn connect(&mut self) -> bool {
        let args = self.args(&["status", "--format", "json"]);
        self.connected = match self.runner.run(&args) {
            Ok(output) if output.success() => true,
            Ok(output) => {
                warn!(
                    cluster = %self.cluster_name,
                    exit_code = output.exit_code,
                    stderr = %output.stderr.trim(),
                    "Cluster status probe failed"
                );
                false
            }
            Err(e) => {
                warn!(cluster = %self.cluster_name, error = %e, "Cluster status probe failed");
                false
            }
        };
        self.connected
    }

    fn list_pools(&mut self) -> Result<Vec<String>, ProvisionError> {
        let args = self.args(&["osd", "pool", "ls", "--format", "json"]);
        let output = self
            .runner
            .run(&args)
            .map_err(|e| ProvisionError::ConnectionFailure(e.to_string()))?;

        if !output.success() {
            return Err(ProvisionError::ConnectionFailure(format!(
                "Failed to list available pools: {}",
                ProvisionError::command_failed(&args, &output)
            )));
        }

        let pools = parse_pool_list(&output.stdout)?;
        debug!(cluster = %self.cluster_name, count = pools.len(), "Listed pools");
        Ok(pools)
    }

    fn add_pool(&mut self, name: &str, pg_num: u32) -> Result<bool, ProvisionError> {
        let pg = pg_num.to_string();
        let args = self.args(&["osd", "pool", "create", name, pg.as_str()]);
        let output = self.runner.run(&args)?;

        if !output.success() {
            return Err(ProvisionError::command_failed(&args, &output));
        }
        Ok(true)
    }
}

/// Parse `osd pool ls --format json` output
pub fn parse_pool_list(raw: &str) -> Result<Vec<String>, ProvisionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).map_err(|e| {
        ProvisionError::ConnectionFailure(format!("Failed to parse pool list: {}", e))
    })
}
