//! Error types for gateway provisioning

use crate::runner::{CommandOutput, RunnerError};

/// Provisioning errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProvisionError {
    #[error("Invalid gateway identity: {0}")]
    InvalidIdentity(String),

    #[error("Precondition missing: {0}")]
    PreconditionMissing(String),

    #[error("Cluster connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Failed executing '{command}' Error rc={exit_code}, stdout={stdout} stderr={stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Command runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(String),
}

impl ProvisionError {
    /// Build a `CommandFailed` from the argument vector and its captured output
    pub fn command_failed(args: &[String], output: &CommandOutput) -> Self {
        Self::CommandFailed {
            command: args.join(" "),
            exit_code: output.exit_code,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        }
    }

    pub(crate) fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }

    /// Short command line for log fields
    pub fn command_line(&self) -> Option<String> {
        match self {
            Self::CommandFailed { command, .. } => Some(command.clone()),
            _ => None,
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display_matches_template() {
        let args: Vec<String> = ["ceph", "auth", "del", "client.rgw.gw1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = CommandOutput {
            exit_code: 13,
            stdout: "".to_string(),
            stderr: "permission denied".to_string(),
        };

        let err = ProvisionError::command_failed(&args, &output);
        assert_eq!(
            err.to_string(),
            "Failed executing 'ceph auth del client.rgw.gw1' Error rc=13, stdout= stderr=permission denied"
        );
        assert_eq!(
            err.command_line().as_deref(),
            Some("ceph auth del client.rgw.gw1")
        );
    }

    #[test]
    fn test_kind_templates() {
        assert_eq!(
            ProvisionError::InvalidIdentity("rgw name must start with 'rgw.'".into()).to_string(),
            "Invalid gateway identity: rgw name must start with 'rgw.'"
        );
        assert_eq!(
            ProvisionError::ConnectionFailure("Cant connect to cluster.".into()).to_string(),
            "Cluster connection failure: Cant connect to cluster."
        );
    }
}
