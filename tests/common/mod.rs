//! Shared fixtures: a scripted `ceph` CLI and a sandboxed library root

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rgw_provision::binary::ServiceBinary;
use rgw_provision::runner::{CommandOutput, CommandRunner, RunnerError};
use rgw_provision::{KeyringPaths, ProvisioningController};
use tempfile::TempDir;

pub const CLUSTER: &str = "ceph";

/// Mutable cluster state behind the fake CLI
#[derive(Debug)]
pub struct ClusterState {
    pub reachable: bool,
    pub principals: BTreeSet<String>,
    pub pools: Vec<String>,
    /// Pool names whose creation is refused
    pub refuse_pools: Vec<String>,
    /// `auth get-or-create` writes a partial keyring then exits non-zero
    pub fail_auth_after_partial_write: bool,
    pub calls: Vec<Vec<String>>,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self {
            reachable: true,
            principals: BTreeSet::new(),
            pools: Vec::new(),
            refuse_pools: Vec::new(),
            fail_auth_after_partial_write: false,
            calls: Vec::new(),
        }
    }
}

/// Emulates the subset of the `ceph` CLI the provisioner drives
#[derive(Default)]
pub struct FakeCeph {
    pub state: Mutex<ClusterState>,
}

fn reply(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

impl FakeCeph {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().unwrap().reachable = reachable;
    }

    pub fn has_principal(&self, principal: &str) -> bool {
        self.state.lock().unwrap().principals.contains(principal)
    }
}

impl CommandRunner for FakeCeph {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());

        assert_eq!(args[0], "ceph");
        assert_eq!(args[1..3], ["--connect-timeout", "5"]);

        if !state.reachable {
            return Ok(reply(1, "", "error connecting to the cluster: timed out"));
        }

        // Skip `--flag value` global options
        let mut i = 1;
        while i < args.len() && args[i].starts_with("--") {
            i += 2;
        }
        let command: Vec<&str> = args[i..].iter().map(String::as_str).collect();

        let output = match command.as_slice() {
            ["status", ..] => reply(0, "{\"health\":\"HEALTH_OK\"}", ""),
            ["osd", "pool", "ls", ..] => {
                reply(0, &serde_json::to_string(&state.pools).unwrap(), "")
            }
            ["osd", "pool", "create", name, _pg] => {
                if state.refuse_pools.iter().any(|p| p == name) {
                    reply(1, "", "Error EPERM: pool creation refused")
                } else {
                    state.pools.push(name.to_string());
                    reply(0, "", &format!("pool '{}' created", name))
                }
            }
            ["auth", "get-or-create", principal, .., "-o", path] => {
                if state.fail_auth_after_partial_write {
                    fs::write(path, "[client").unwrap();
                    reply(13, "", "Error EACCES: access denied")
                } else {
                    state.principals.insert(principal.to_string());
                    let key = format!("AQ{:04}==", state.calls.len());
                    fs::write(path, format!("[{}]\n\tkey = {}\n", principal, key)).unwrap();
                    reply(0, "", "")
                }
            }
            ["auth", "del", principal] => {
                state.principals.remove(*principal);
                reply(0, "", "updated")
            }
            _ => reply(22, "", "Error EINVAL: unknown command"),
        };
        Ok(output)
    }
}

/// Temporary lib root, bootstrap keyring and gateway binary
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let sandbox = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(sandbox.bootstrap_dir()).unwrap();
        fs::write(sandbox.bootstrap_dir().join("ceph.keyring"), "[client.bootstrap-rgw]\n").unwrap();
        fs::write(sandbox.binary(), "#!/bin/sh\n").unwrap();
        sandbox
    }

    pub fn lib_root(&self) -> PathBuf {
        self.dir.path().join("lib").join("radosgw")
    }

    pub fn bootstrap_dir(&self) -> PathBuf {
        self.dir.path().join("bootstrap-rgw")
    }

    pub fn binary(&self) -> PathBuf {
        self.dir.path().join("radosgw")
    }

    pub fn controller(&self, name: &str, runner: Arc<FakeCeph>) -> ProvisioningController {
        ProvisioningController::new(name, CLUSTER, runner)
            .with_paths(KeyringPaths::new(self.lib_root(), self.bootstrap_dir()))
            .with_binary(ServiceBinary::new(Some(self.binary())))
    }
}
