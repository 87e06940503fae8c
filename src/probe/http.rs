//! HTTP health endpoint probe.
//!
//! Issues a GET against a service's health URL with a short per-request
//! timeout. A response with a status below 400 means ready; connection and
//! timeout failures are classified as transient.
//!
//! Health URLs are always plain `http://`, so the client carries no TLS
//! backend and never reads a CA store. It is built on the first check; a
//! build failure is an ordinary probe error and gets retried.

use super::{Probe, ProbeError, Ready};
use anyhow::anyhow;
use reqwest::blocking::{Client, Response};
use std::time::Duration;

/// Probes an HTTP health endpoint.
pub struct HttpHealthProbe {
    client: Option<Client>,
    url: String,
    timeout: Duration,
}

impl HttpHealthProbe {
    /// Create a probe for `url` with the given per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: None,
            url: url.into(),
            timeout,
        }
    }

    fn client(&mut self) -> Result<&Client, ProbeError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => Client::builder()
                .user_agent(concat!("wait-for-services/", env!("CARGO_PKG_VERSION")))
                .timeout(self.timeout)
                .build()
                .map_err(|e| {
                    anyhow!("failed to build HTTP client for {}: {}", self.url, describe(&e))
                })?,
        };
        Ok(self.client.insert(client))
    }

    /// The URL this probe requests.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Probe for HttpHealthProbe {
    fn check(&mut self) -> Result<bool, ProbeError> {
        let url = self.url.clone();
        let response = self.client()?.get(&url).send().map_err(classify)?;
        tracing::debug!("GET {} returned {}", self.url, response.status());
        Ok(response.is_ready())
    }
}

/// A response is ready when its status is not a client or server error.
impl Ready for Response {
    fn is_ready(&self) -> bool {
        let status = self.status();
        !status.is_client_error() && !status.is_server_error()
    }
}

fn classify(err: reqwest::Error) -> ProbeError {
    if err.is_connect() || err.is_timeout() {
        ProbeError::unavailable(describe(&err))
    } else {
        ProbeError::Other(err.into())
    }
}

/// Flatten an error and its sources into one line.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
