//! Hand-off to the real workload.
//!
//! On Unix the gate's process image is replaced with the target command, so
//! the command keeps the gate's PID and receives signals directly. Elsewhere
//! the command is spawned and waited for, and its exit code becomes ours.

use crate::error::{GateError, Result};
use std::convert::Infallible;
use std::ffi::OsString;
use std::process::Command;

/// Replace the current process with `command` (`command[0]` is the program).
///
/// Only returns on failure.
pub fn hand_off(command: &[OsString]) -> Result<Infallible> {
    let (program, args) = command.split_first().ok_or_else(|| GateError::HandOff {
        command: String::new(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no command given"),
    })?;

    let mut cmd = Command::new(program);
    cmd.args(args);
    tracing::info!("Starting {}", display_command(command));
    replace_process(cmd, program)
}

#[cfg(unix)]
fn replace_process(mut cmd: Command, program: &OsString) -> Result<Infallible> {
    use std::os::unix::process::CommandExt;

    let source = cmd.exec();
    Err(GateError::HandOff {
        command: program.to_string_lossy().into_owned(),
        source,
    })
}

#[cfg(not(unix))]
fn replace_process(mut cmd: Command, program: &OsString) -> Result<Infallible> {
    let command = program.to_string_lossy().into_owned();
    let status = cmd
        .status()
        .map_err(|source| GateError::HandOff {
            command: command.clone(),
            source,
        })?;
    match status.code() {
        Some(code) => std::process::exit(code),
        None => Err(GateError::TerminatedBySignal { command }),
    }
}

/// Render a command line for logging.
pub fn display_command(command: &[OsString]) -> String {
    command
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
