//! wait-for-services CLI entry point.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wait_for_services::cli::Cli;
use wait_for_services::signals::install_termination_handlers;

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. `--log-level` / `LOGGING_LEVEL_APP` (default INFO)
fn init_tracing(debug: bool, level: &str) {
    let filter = if debug {
        EnvFilter::new("wait_for_services=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(format!("wait_for_services={}", tracing_level(level)))
                .unwrap_or_else(|_| EnvFilter::new("wait_for_services=info"))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Map Python-style level names onto tracing's.
fn tracing_level(level: &str) -> String {
    match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

fn main() -> ExitCode {
    if let Err(e) = install_termination_handlers() {
        eprintln!("Error: failed to install signal handlers: {}", e);
        return ExitCode::from(1);
    }

    let cli = Cli::parse();
    init_tracing(cli.debug, &cli.log_level);

    match wait_for_services::run(&cli) {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(1)
        }
    }
}
