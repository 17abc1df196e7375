//! Shell command execution
//!
//! This module runs rendered shell commands on behalf of `exec` steps.

use crate::config::Values;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::expression::value_to_string;
use crate::runner::Context;
use std::fs;
use std::process::{Command as StdCommand, Stdio};

/// Project variables as environment variables for a child process
///
/// Variable names are used verbatim; structured values are passed as YAML.
pub fn shell_vars(values: &Values) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(name, value)| (name.clone(), value_to_string(value)))
        .collect()
}

/// Execute a shell command in the project directory
pub fn run_shell(command_str: &str, ctx: &Context) -> ExecutionResult<()> {
    let Some((program, interpreter_args)) = ctx.interpreter.split_first() else {
        return Err(ExecutionError::Spawn {
            command: command_str.to_string(),
            error: "no interpreter configured".to_string(),
        });
    };

    // The project directory may not exist until the first step writes to it
    fs::create_dir_all(&ctx.project_dir).map_err(|e| ExecutionError::Spawn {
        command: command_str.to_string(),
        error: format!("creating {}: {}", ctx.project_dir.display(), e),
    })?;

    let mut command = StdCommand::new(program);

    // Add interpreter args (e.g., "-c" for sh/bash)
    command.args(interpreter_args);
    command.arg(command_str);
    command.current_dir(&ctx.project_dir);

    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    command.envs(shell_vars(&ctx.values));
    if !ctx.path_env_var.is_empty() {
        command.env("PATH", &ctx.path_env_var);
    }

    let status = command.status().map_err(|e| ExecutionError::Spawn {
        command: command_str.to_string(),
        error: e.to_string(),
    })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed(status.code()));
    }

    Ok(())
}
