//! Native backend: spawn the process directly

use std::process::Command;

use tracing::{debug, info};

use super::{render_command, CommandOutput, CommandRunner, RunnerError};

/// Runs commands with `std::process::Command`, no shell involved
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRunner;

impl CommandRunner for NativeRunner {
    fn run(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        let (program, rest) = args.split_first().ok_or(RunnerError::EmptyCommand)?;

        info!("executing {}", render_command(args));

        let output = Command::new(program)
            .args(rest)
            .output()
            .map_err(|e| RunnerError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        // Killed by a signal: no exit code, report as -1
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(program = %program, exit_code, "command finished");

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
