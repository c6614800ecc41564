//! Gateway service binary discovery

use std::path::{Path, PathBuf};

/// Program name of the gateway daemon
pub const GATEWAY_BINARY: &str = "radosgw";

/// Init service the gateway runs under
pub const GATEWAY_SERVICE: &str = "ceph-radosgw";

/// Locates the gateway binary: an explicit path, or a `PATH` search
#[derive(Debug, Clone, Default)]
pub struct ServiceBinary {
    configured: Option<PathBuf>,
}

impl ServiceBinary {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }

    /// Path of the binary if it exists on this host
    pub fn resolve(&self) -> Option<PathBuf> {
        match &self.configured {
            Some(path) => path.is_file().then(|| path.clone()),
            None => search_path(GATEWAY_BINARY, std::env::var_os("PATH")),
        }
    }

    /// What `resolve` looks for, for error messages
    pub fn describe(&self) -> String {
        match &self.configured {
            Some(path) => path.display().to_string(),
            None => format!("{} on PATH", GATEWAY_BINARY),
        }
    }
}

fn search_path(program: &str, path_var: Option<std::ffi::OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
