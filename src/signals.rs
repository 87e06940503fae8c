//! Termination signal handling.
//!
//! While the gate waits, `SIGINT` and `SIGTERM` end the process at once with
//! a message naming the signal and exit status 1. The handlers live only as
//! long as the gate's own process image: `exec` resets caught signals to
//! their default disposition, so the handed-off command starts clean.

use crate::error::Result;

/// Exit status used when a termination signal stops the gate.
pub const SIGNAL_EXIT_CODE: i32 = 1;

/// Install the termination handlers. Call once, before any check starts.
#[cfg(unix)]
pub fn install_termination_handlers() -> Result<()> {
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: the handler only calls async-signal-safe functions
        // (write(2) and _exit(2)) and touches no shared state.
        let previous = unsafe {
            libc::signal(
                signal,
                handle_termination as extern "C" fn(libc::c_int) as libc::sighandler_t,
            )
        };
        if previous == libc::SIG_ERR {
            return Err(std::io::Error::last_os_error().into());
        }
    }
    Ok(())
}

/// Without POSIX signals the default Ctrl-C behavior already terminates.
#[cfg(not(unix))]
pub fn install_termination_handlers() -> Result<()> {
    Ok(())
}

/// Message written to stderr when `signum` stops the gate.
#[cfg(unix)]
fn termination_message(signum: libc::c_int) -> &'static [u8] {
    match signum {
        libc::SIGINT => b"Stopped, SIGINT received.\n",
        libc::SIGTERM => b"Stopped, SIGTERM received.\n",
        _ => b"Stopped, signal received.\n",
    }
}

#[cfg(unix)]
extern "C" fn handle_termination(signum: libc::c_int) {
    let message = termination_message(signum);
    // SAFETY: write(2) and _exit(2) are async-signal-safe; the buffer is static.
    unsafe {
        libc::write(libc::STDERR_FILENO, message.as_ptr().cast(), message.len());
        libc::_exit(SIGNAL_EXIT_CODE);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_signal() {
        assert_eq!(termination_message(libc::SIGINT), b"Stopped, SIGINT received.\n");
        assert_eq!(termination_message(libc::SIGTERM), b"Stopped, SIGTERM received.\n");
    }

    #[test]
    fn unknown_signals_get_generic_message() {
        assert_eq!(termination_message(libc::SIGHUP), b"Stopped, signal received.\n");
    }

    #[test]
    fn exit_code_is_failure() {
        assert_ne!(SIGNAL_EXIT_CODE, 0);
    }
}
