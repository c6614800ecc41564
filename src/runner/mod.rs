//! Command runner - external control-plane command execution
//!
//! Runs an argument vector without shell interpretation and hands back the
//! exit code together with the captured output. A non-zero exit is not an
//! error at this layer; callers inspect `exit_code` themselves.
//!
//! Two backends are available and are injected by the caller:
//! - [`NativeRunner`] spawns the process directly
//! - [`HostRuntimeRunner`] delegates execution to the host automation agent

pub mod host;
pub mod native;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use host::HostRuntimeRunner;
pub use native::NativeRunner;

/// Captured result of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runner errors: the command could not be executed at all
#[derive(Debug, Clone, thiserror::Error)]
pub enum RunnerError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("Invalid response from host runtime: {0}")]
    InvalidResponse(String),
}

/// Executes external commands on behalf of the controller
pub trait CommandRunner: Send + Sync {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        (**self).run(args)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        (**self).run(args)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        (**self).run(args)
    }
}

/// Which backend executes commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunnerBackend {
    /// Spawn processes directly
    #[default]
    Native,
    /// Delegate to the host automation agent
    Host,
}

/// Build the runner selected by configuration
pub fn build_runner(backend: RunnerBackend, host_agent: &str) -> Arc<dyn CommandRunner> {
    match backend {
        RunnerBackend::Native => Arc::new(NativeRunner),
        RunnerBackend::Host => Arc::new(HostRuntimeRunner::new(host_agent)),
    }
}

/// Render an argument vector for logs, quoting arguments that contain spaces
pub fn render_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains(' ') {
                format!("'{}'", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
