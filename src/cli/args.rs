//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct. Every setting can also be
//! supplied through the environment variable named in its help text, which
//! is how container deployments usually configure the gate.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use sqlx::postgres::PgSslMode;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Wait for dependent services to come up, then exec the given command.
#[derive(Debug, Parser)]
#[command(name = "wait-for-services")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Check that PostgreSQL accepts connections
    #[arg(long, env = "DB_AVAILABLE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub db_available: bool,

    /// PostgreSQL host
    #[arg(long, env = "POSTGRESQL_HOST", default_value = "localhost")]
    pub db_host: String,

    /// PostgreSQL port
    #[arg(long, env = "POSTGRESQL_PORT", default_value_t = 5432)]
    pub db_port: u16,

    /// PostgreSQL user
    #[arg(long, env = "POSTGRESQL_USER", default_value = "vmaas_admin")]
    pub db_user: String,

    /// PostgreSQL password
    #[arg(
        long,
        env = "POSTGRESQL_PASSWORD",
        default_value = "vmaas_admin_pwd",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub db_password: String,

    /// PostgreSQL database name
    #[arg(long, env = "POSTGRESQL_DATABASE", default_value = "vmaas")]
    pub db_name: String,

    /// PostgreSQL SSL mode (disable, allow, prefer, require, verify-ca, verify-full)
    #[arg(long, env = "POSTGRESQL_SSL_MODE", default_value = "prefer", value_parser = parse_ssl_mode)]
    pub db_ssl_mode: PgSslMode,

    /// CA certificate used to verify the PostgreSQL server
    #[arg(long, env = "POSTGRESQL_SSL_ROOT_CERT_PATH")]
    pub db_ssl_root_cert: Option<PathBuf>,

    /// Websocket server host (empty disables the check)
    #[arg(long, env = "WEBSOCKET_HOST")]
    pub websocket_host: Option<String>,

    /// Websocket server port
    #[arg(long, env = "WEBSOCKET_PORT", default_value_t = 8082)]
    pub websocket_port: u16,

    /// Reposcan API host (empty disables the check)
    #[arg(long, env = "REPOSCAN_HOST")]
    pub reposcan_host: Option<String>,

    /// Reposcan API port
    #[arg(long, env = "REPOSCAN_PORT", default_value_t = 8081)]
    pub reposcan_port: u16,

    /// Hostname of the pod this gate runs in
    #[arg(long, env = "HOSTNAME", default_value = "")]
    pub hostname: String,

    /// Running as an init container
    #[arg(long = "init-container", env = "IS_INIT_CONTAINER", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub is_init_container: bool,

    /// Seconds to sleep between attempts
    #[arg(long, env = "WAIT_RETRY_DELAY", default_value = "1", value_parser = parse_seconds)]
    pub retry_delay: Duration,

    /// Seconds before an HTTP health request is abandoned
    #[arg(long, env = "WAIT_HTTP_TIMEOUT", default_value = "1", value_parser = parse_timeout)]
    pub http_timeout: Duration,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LOGGING_LEVEL_APP", default_value = "info")]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Command to exec once every dependency is up
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<OsString>,
}

/// Parse a non-negative, possibly fractional number of seconds.
pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("'{}' is not a non-negative number of seconds", value))
}

/// Parse a strictly positive number of seconds. A zero timeout would fail
/// every request.
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let timeout = parse_seconds(value)?;
    if timeout.is_zero() {
        return Err(format!("'{}' is not a positive number of seconds", value));
    }
    Ok(timeout)
}

/// Parse a libpq-style `sslmode` value.
pub fn parse_ssl_mode(value: &str) -> Result<PgSslMode, String> {
    value
        .parse()
        .map_err(|_| format!("unknown SSL mode '{}'", value))
}
