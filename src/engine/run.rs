use std::process::{Command, ExitStatus, Output, Stdio};

use tracing::debug;

use super::types::EngineError;

/// Render a program and its arguments the way a user would type them.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(program);
    words.extend(args.iter().map(String::as_str));
    shell_words::join(words)
}

/// Run a command with captured stdout/stderr. Does not check the exit status.
pub fn capture(program: &str, args: &[String]) -> Result<Output, EngineError> {
    debug!("Running {}", command_line(program, args));

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| EngineError::Spawn {
            program: program.to_string(),
            source,
        })
}

/// Run a command with captured output and return its stdout on success.
pub fn capture_success(program: &str, args: &[String]) -> Result<String, EngineError> {
    let output = capture(program, args)?;
    if !output.status.success() {
        return Err(failed(program, args, output.status, &output.stderr));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command with inherited stdin/stdout/stderr, so the user can watch
/// progress or interact with it.
pub fn inherit(program: &str, args: &[String]) -> Result<(), EngineError> {
    debug!("Running {}", command_line(program, args));

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| EngineError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(failed(program, args, status, &[]));
    }
    Ok(())
}

pub fn failed(program: &str, args: &[String], status: ExitStatus, stderr: &[u8]) -> EngineError {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    EngineError::Failed {
        command: command_line(program, args),
        status: status.to_string(),
        detail: if stderr.is_empty() {
            String::new()
        } else {
            format!(": {stderr}")
        },
    }
}
