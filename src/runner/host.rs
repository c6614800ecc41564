//! Host-runtime backend: delegate execution to the host automation agent
//!
//! The agent is invoked as
//!
//! ```text
//! salt-call --local --out=json cmd.run_all '["ceph", ...]' python_shell=False
//! ```
//!
//! and answers with `{"local": {"retcode": .., "stdout": .., "stderr": ..}}`.
//! The argument vector travels as a JSON list so the agent never hands it to
//! a shell.

use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

use super::{render_command, CommandOutput, CommandRunner, RunnerError};

/// Default agent program
pub const DEFAULT_HOST_AGENT: &str = "salt-call";

/// Runs commands through the host automation agent
#[derive(Debug, Clone)]
pub struct HostRuntimeRunner {
    agent: String,
}

#[derive(Debug, Deserialize)]
struct AgentReply {
    local: RunAllResult,
}

#[derive(Debug, Deserialize)]
struct RunAllResult {
    retcode: i32,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

impl HostRuntimeRunner {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
        }
    }

    fn agent_args(&self, args: &[String]) -> Result<Vec<String>, RunnerError> {
        let argv = serde_json::to_string(args)
            .map_err(|e| RunnerError::InvalidResponse(e.to_string()))?;
        Ok(vec![
            "--local".to_string(),
            "--out=json".to_string(),
            "cmd.run_all".to_string(),
            argv,
            "python_shell=False".to_string(),
        ])
    }
}

impl Default for HostRuntimeRunner {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_AGENT)
    }
}

impl CommandRunner for HostRuntimeRunner {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        if args.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }

        info!(agent = %self.agent, "executing {}", render_command(args));

        let output = Command::new(&self.agent)
            .args(self.agent_args(args)?)
            .output()
            .map_err(|e| RunnerError::Spawn {
                program: self.agent.clone(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_reply(&stdout) {
            Ok(result) => {
                debug!(exit_code = result.exit_code, "host runtime command finished");
                Ok(result)
            }
            Err(e) => Err(RunnerError::InvalidResponse(format!(
                "{} (agent stderr: {})",
                e,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

/// Parse the agent's JSON reply into a command result
pub fn parse_reply(raw: &str) -> Result<CommandOutput, String> {
    let reply: AgentReply = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    Ok(CommandOutput {
        exit_code: reply.local.retcode,
        stdout: reply.local.stdout,
        stderr: reply.local.stderr,
    })
}
