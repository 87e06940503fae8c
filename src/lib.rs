//! wait-for-services - block until dependent services are up, then exec.
//!
//! The gate checks a PostgreSQL database and the health endpoints of the
//! websocket server and the reposcan API, strictly in that order, retrying
//! each with a fixed delay for as long as it takes. Once every required
//! dependency answers, the process image is replaced with the command given
//! on the command line.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Resolved settings
//! - [`error`] - Error types and result aliases
//! - [`gate`] - Dependency plan and sequential waiting
//! - [`handoff`] - Process replacement
//! - [`probe`] - Readiness probes (database, HTTP)
//! - [`signals`] - Termination signal handlers
//! - [`wait`] - The retry loop
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use wait_for_services::probe::ProbeError;
//! use wait_for_services::wait::wait_until_ready_with;
//!
//! let mut attempts_left = 3;
//! let mut probe = || -> Result<bool, ProbeError> {
//!     attempts_left -= 1;
//!     Ok(attempts_left == 0)
//! };
//! let attempts = wait_until_ready_with(&mut probe, "example", Duration::ZERO, |_| {});
//! assert_eq!(attempts, 3);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod handoff;
pub mod probe;
pub mod signals;
pub mod wait;

pub use error::{GateError, Result};

use std::convert::Infallible;

/// Wait for every configured dependency, then hand off to `cli.command`.
///
/// Returns only if the hand-off fails or a probe cannot be set up.
pub fn run(cli: &cli::Cli) -> Result<Infallible> {
    let settings = config::Settings::from(cli);
    tracing::debug!("Resolved settings: {:?}", settings);

    let report = gate::Gate::new(&settings, gate::LiveProbes::new(&settings)).run()?;
    tracing::debug!(
        "All dependencies ready (checked {}, skipped {})",
        report.checked.len(),
        report.skipped.len()
    );

    handoff::hand_off(&cli.command)
}
