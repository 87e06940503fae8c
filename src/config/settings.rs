//! Gate settings.
//!
//! [`Settings`] is the resolved view of the command line and environment:
//! which dependencies exist, where they live, and how patiently to wait for
//! them. It is built once at startup from the parsed [`Cli`].

use crate::cli::Cli;
use sqlx::postgres::PgSslMode;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Path of the monitoring endpoint every HTTP dependency exposes.
pub const HEALTH_PATH: &str = "/api/v1/monitoring/health";

/// Resolved gate configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Whether this deployment has a database to wait for.
    pub db_available: bool,
    /// Connection parameters for the database probe.
    pub database: DatabaseSettings,
    /// Websocket server, if configured.
    pub websocket: Option<ServiceEndpoint>,
    /// Reposcan API, if configured.
    pub reposcan: Option<ServiceEndpoint>,
    /// Hostname of the pod running the gate.
    pub pod_hostname: String,
    /// Whether the gate runs as an init container.
    pub is_init_container: bool,
    /// Sleep between failed attempts.
    pub retry_delay: Duration,
    /// Per-request timeout for HTTP probes.
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_available: false,
            database: DatabaseSettings::default(),
            websocket: None,
            reposcan: None,
            pod_hostname: String::new(),
            is_init_container: false,
            retry_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(1),
        }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        let mut database = DatabaseSettings::new(
            &cli.db_host,
            cli.db_port,
            &cli.db_user,
            &cli.db_password,
            &cli.db_name,
        );
        database.ssl_mode = cli.db_ssl_mode;
        database.ssl_root_cert = cli.db_ssl_root_cert.clone();

        Self {
            db_available: cli.db_available,
            database,
            websocket: ServiceEndpoint::from_parts(cli.websocket_host.as_deref(), cli.websocket_port),
            reposcan: ServiceEndpoint::from_parts(cli.reposcan_host.as_deref(), cli.reposcan_port),
            pod_hostname: cli.hostname.clone(),
            is_init_container: cli.is_init_container,
            retry_delay: cli.retry_delay,
            http_timeout: cli.http_timeout,
        }
    }
}

/// Host and port of an HTTP dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// An endpoint only exists when the host is set and non-blank.
    pub fn from_parts(host: Option<&str>, port: u16) -> Option<Self> {
        host.map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| Self::new(h, port))
    }

    /// URL of the endpoint's health check.
    pub fn health_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, HEALTH_PATH)
    }
}

/// PostgreSQL connection parameters.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    password: String,
    pub name: String,
    pub ssl_mode: PgSslMode,
    pub ssl_root_cert: Option<PathBuf>,
}

impl DatabaseSettings {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            name: name.into(),
            ssl_mode: PgSslMode::Prefer,
            ssl_root_cert: None,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self::new("localhost", 5432, "vmaas_admin", "vmaas_admin_pwd", "vmaas")
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("ssl_root_cert", &self.ssl_root_cert)
            .finish()
    }
}
