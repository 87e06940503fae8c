//! PostgreSQL connection probe.
//!
//! The probe owns a single-threaded tokio runtime and a prepared set of
//! connect options, both built once up front. Each check opens a fresh
//! connection and closes it again; the dependency is ready as soon as a
//! connection can be obtained.

use super::{Probe, ProbeError};
use crate::config::DatabaseSettings;
use crate::error::{GateError, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tokio::runtime::{Builder, Runtime};

/// Probes a PostgreSQL server by opening a connection.
pub struct DatabaseProbe {
    runtime: Runtime,
    options: PgConnectOptions,
}

impl DatabaseProbe {
    /// Prepare the driver state for the given database settings.
    pub fn new(settings: &DatabaseSettings) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GateError::DatabaseSetup {
                message: e.to_string(),
            })?;

        Ok(Self {
            runtime,
            options: connect_options(settings),
        })
    }

    /// The options each connection attempt uses.
    pub fn options(&self) -> &PgConnectOptions {
        &self.options
    }
}

impl Probe for DatabaseProbe {
    fn check(&mut self) -> std::result::Result<bool, ProbeError> {
        let connection = self
            .runtime
            .block_on(PgConnection::connect_with(&self.options))
            .map_err(classify)?;

        if let Err(e) = self.runtime.block_on(connection.close()) {
            tracing::debug!("Closing probe connection failed: {}", e);
        }
        Ok(true)
    }
}

fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    let options = PgConnectOptions::new_without_pgpass()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(settings.password())
        .database(&settings.name)
        .ssl_mode(settings.ssl_mode)
        .application_name("wait-for-services");

    match &settings.ssl_root_cert {
        Some(path) => options.ssl_root_cert(path),
        None => options,
    }
}

/// Server-reported errors and connection-level failures are transient; the
/// rest (configuration, decoding, driver bugs) fall into the generic tier.
fn classify(err: sqlx::Error) -> ProbeError {
    match err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => ProbeError::unavailable_with_code(db.message(), code),
            None => ProbeError::unavailable(db.message()),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut => ProbeError::unavailable(err.to_string()),
        other => ProbeError::Other(other.into()),
    }
}
