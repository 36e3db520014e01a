//! External command execution.

use crate::error::{BuildError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing an external command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output, when captured.
    pub stdout: String,

    /// Standard error, when captured.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with the inherited environment).
    pub env: HashMap<String, String>,

    /// Capture stdout and stderr instead of inheriting them.
    pub capture: bool,
}

impl CommandOptions {
    /// Options running in `cwd` with inherited output.
    pub fn in_dir(cwd: &Path) -> Self {
        Self {
            cwd: Some(cwd.to_path_buf()),
            ..Default::default()
        }
    }
}

/// Execute a command line through the platform shell.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let (shell, flag) = if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    };

    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);
    run(cmd, command, options)
}

/// Execute a program directly with arguments, bypassing the shell.
pub fn execute_program(
    program: &str,
    args: &[String],
    options: &CommandOptions,
) -> Result<CommandResult> {
    let command_line = std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");

    let mut cmd = Command::new(program);
    cmd.args(args);
    run(cmd, &command_line, options)
}

/// Turn an unsuccessful result into [`BuildError::CommandFailed`].
pub fn check(result: CommandResult, command: &str) -> Result<CommandResult> {
    if result.success {
        Ok(result)
    } else {
        Err(BuildError::CommandFailed {
            command: command.to_string(),
            code: result.exit_code,
        })
    }
}

fn run(mut cmd: Command, command_line: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    tracing::debug!("Running: {}", command_line);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    let stdio = || {
        if options.capture {
            Stdio::piped()
        } else {
            Stdio::inherit()
        }
    };
    cmd.stdout(stdio()).stderr(stdio());

    let output = cmd.output().map_err(|e| {
        tracing::debug!("Failed to start {}: {}", command_line, e);
        BuildError::CommandFailed {
            command: command_line.to_string(),
            code: None,
        }
    })?;

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
        success: output.status.success(),
    })
}
