//! The readiness gate.
//!
//! The gate walks the dependencies in a fixed order (database, websocket
//! server, reposcan API), decides for each whether this deployment needs to
//! wait for it, and blocks in [`wait_until_ready`] until it is up before
//! moving on to the next one.

use std::fmt;
use std::time::Duration;

use anyhow::anyhow;

use crate::config::Settings;
use crate::error::Result;
use crate::probe::{DatabaseProbe, HttpHealthProbe, Probe};
use crate::wait::wait_until_ready_with;

/// Hostname fragment identifying the websocket server's own pods.
pub const WEBSOCKET_POD_MARKER: &str = "vmaas-websocket";

/// Hostname fragment identifying the reposcan service's own pods.
pub const REPOSCAN_POD_MARKER: &str = "vmaas-reposcan";

/// A service the gate can wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    Database,
    Websocket,
    Reposcan,
}

impl Dependency {
    /// Every dependency, in the order the gate checks them.
    pub const ALL: [Dependency; 3] = [
        Dependency::Database,
        Dependency::Websocket,
        Dependency::Reposcan,
    ];

    /// Name used in log messages.
    pub fn service_name(self) -> &'static str {
        match self {
            Dependency::Database => "PostgreSQL",
            Dependency::Websocket => "Websocket server",
            Dependency::Reposcan => "Reposcan API",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Whether a dependency is waited for or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Check,
    Skip,
}

/// Decide whether `dependency` must be waited for under `settings`.
///
/// A service never waits for itself, and init containers do not wait for
/// the websocket server.
pub fn decide(settings: &Settings, dependency: Dependency) -> Decision {
    let wanted = match dependency {
        Dependency::Database => settings.db_available,
        Dependency::Websocket => {
            settings.websocket.is_some()
                && !settings.pod_hostname.contains(WEBSOCKET_POD_MARKER)
                && !settings.is_init_container
        }
        Dependency::Reposcan => {
            settings.reposcan.is_some() && !settings.pod_hostname.contains(REPOSCAN_POD_MARKER)
        }
    };

    if wanted {
        Decision::Check
    } else {
        Decision::Skip
    }
}

/// The decision for every dependency, in check order.
pub fn plan(settings: &Settings) -> Vec<(Dependency, Decision)> {
    Dependency::ALL
        .iter()
        .map(|&dependency| (dependency, decide(settings, dependency)))
        .collect()
}

/// Creates the probe for a dependency the gate is about to wait for.
pub trait ProbeFactory {
    fn probe(&mut self, dependency: Dependency) -> Result<Box<dyn Probe>>;
}

impl<F> ProbeFactory for F
where
    F: FnMut(Dependency) -> Result<Box<dyn Probe>>,
{
    fn probe(&mut self, dependency: Dependency) -> Result<Box<dyn Probe>> {
        self(dependency)
    }
}

/// Probes that talk to the real services described by [`Settings`].
pub struct LiveProbes<'a> {
    settings: &'a Settings,
}

impl<'a> LiveProbes<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl ProbeFactory for LiveProbes<'_> {
    fn probe(&mut self, dependency: Dependency) -> Result<Box<dyn Probe>> {
        let endpoint = match dependency {
            Dependency::Database => {
                return Ok(Box::new(DatabaseProbe::new(&self.settings.database)?));
            }
            Dependency::Websocket => self.settings.websocket.as_ref(),
            Dependency::Reposcan => self.settings.reposcan.as_ref(),
        };

        let endpoint = endpoint.ok_or_else(|| anyhow!("no endpoint configured for {}", dependency))?;
        Ok(Box::new(HttpHealthProbe::new(
            endpoint.health_url(),
            self.settings.http_timeout,
        )))
    }
}

/// What the gate did for each dependency.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GateReport {
    /// Dependencies waited for, with the number of attempts each took.
    pub checked: Vec<(Dependency, u64)>,
    /// Dependencies skipped.
    pub skipped: Vec<Dependency>,
}

/// Waits for every required dependency in turn.
pub struct Gate<'a, F, S = fn(Duration)> {
    settings: &'a Settings,
    probes: F,
    sleep: S,
}

impl<'a, F: ProbeFactory> Gate<'a, F> {
    /// Create a gate that sleeps on the current thread between attempts.
    pub fn new(settings: &'a Settings, probes: F) -> Self {
        Self {
            settings,
            probes,
            sleep: std::thread::sleep,
        }
    }
}

impl<'a, F, S> Gate<'a, F, S>
where
    F: ProbeFactory,
    S: FnMut(Duration),
{
    /// Replace the sleep function (used by tests to avoid real delays).
    pub fn with_sleep<T: FnMut(Duration)>(self, sleep: T) -> Gate<'a, F, T> {
        Gate {
            settings: self.settings,
            probes: self.probes,
            sleep,
        }
    }

    /// Block until every required dependency is up.
    ///
    /// Only probe construction can fail; waiting itself never gives up.
    pub fn run(&mut self) -> Result<GateReport> {
        let mut report = GateReport::default();

        for (dependency, decision) in plan(self.settings) {
            match decision {
                Decision::Skip => {
                    tracing::info!("Skipping {} check", dependency);
                    report.skipped.push(dependency);
                }
                Decision::Check => {
                    let mut probe = self.probes.probe(dependency)?;
                    let attempts = wait_until_ready_with(
                        probe.as_mut(),
                        dependency.service_name(),
                        self.settings.retry_delay,
                        &mut self.sleep,
                    );
                    report.checked.push((dependency, attempts));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceEndpoint;
    use crate::probe::ProbeError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn all_enabled() -> Settings {
        Settings {
            db_available: true,
            websocket: Some(ServiceEndpoint::new("vmaas-websocket", 8082)),
            reposcan: Some(ServiceEndpoint::new("vmaas-reposcan", 8081)),
            pod_hostname: "vmaas-webapp-6d9f7".to_string(),
            ..Settings::default()
        }
    }

    /// Factory whose probes fail `failures` times, recording every call.
    fn recording_factory(
        log: Rc<RefCell<Vec<String>>>,
        failures: usize,
    ) -> impl FnMut(Dependency) -> Result<Box<dyn Probe>> {
        move |dependency| {
            log.borrow_mut().push(format!("create {}", dependency));
            let log = log.clone();
            let mut calls = 0;
            let probe = move || -> std::result::Result<bool, ProbeError> {
                calls += 1;
                log.borrow_mut().push(format!("check {}", dependency));
                if calls <= failures {
                    Err(ProbeError::unavailable("connection refused"))
                } else {
                    Ok(true)
                }
            };
            Ok(Box::new(probe) as Box<dyn Probe>)
        }
    }

    #[test]
    fn plan_checks_everything_when_configured() {
        let decisions: Vec<Decision> = plan(&all_enabled()).into_iter().map(|(_, d)| d).collect();
        assert_eq!(decisions, vec![Decision::Check; 3]);
    }

    #[test]
    fn plan_order_is_fixed() {
        let order: Vec<Dependency> = plan(&Settings::default()).into_iter().map(|(d, _)| d).collect();
        assert_eq!(
            order,
            vec![Dependency::Database, Dependency::Websocket, Dependency::Reposcan]
        );
    }

    #[test]
    fn database_skipped_when_unavailable() {
        let settings = Settings {
            db_available: false,
            ..all_enabled()
        };
        assert_eq!(decide(&settings, Dependency::Database), Decision::Skip);
    }

    #[test]
    fn websocket_skipped_on_its_own_pod() {
        let settings = Settings {
            pod_hostname: "vmaas-websocket-7c5b9-xk2lp".to_string(),
            ..all_enabled()
        };
        assert_eq!(decide(&settings, Dependency::Websocket), Decision::Skip);
        assert_eq!(decide(&settings, Dependency::Reposcan), Decision::Check);
    }

    #[test]
    fn websocket_skipped_in_init_container() {
        let settings = Settings {
            is_init_container: true,
            ..all_enabled()
        };
        assert_eq!(decide(&settings, Dependency::Websocket), Decision::Skip);
        assert_eq!(decide(&settings, Dependency::Reposcan), Decision::Check);
    }

    #[test]
    fn reposcan_skipped_on_its_own_pod() {
        let settings = Settings {
            pod_hostname: "vmaas-reposcan-0".to_string(),
            ..all_enabled()
        };
        assert_eq!(decide(&settings, Dependency::Reposcan), Decision::Skip);
        assert_eq!(decide(&settings, Dependency::Websocket), Decision::Check);
    }

    #[test]
    fn unconfigured_services_are_skipped() {
        let settings = Settings {
            websocket: None,
            reposcan: None,
            ..all_enabled()
        };
        assert_eq!(decide(&settings, Dependency::Websocket), Decision::Skip);
        assert_eq!(decide(&settings, Dependency::Reposcan), Decision::Skip);
    }

    #[test]
    fn checks_run_in_order_without_overlap() {
        let settings = all_enabled();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut gate = Gate::new(&settings, recording_factory(log.clone(), 2)).with_sleep(|_| {});

        let report = gate.run().unwrap();

        let expected: Vec<String> = ["PostgreSQL", "Websocket server", "Reposcan API"]
            .iter()
            .flat_map(|name| {
                vec![
                    format!("create {}", name),
                    format!("check {}", name),
                    format!("check {}", name),
                    format!("check {}", name),
                ]
            })
            .collect();
        assert_eq!(*log.borrow(), expected);
        assert_eq!(
            report.checked,
            vec![
                (Dependency::Database, 3),
                (Dependency::Websocket, 3),
                (Dependency::Reposcan, 3)
            ]
        );
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn skipped_dependencies_never_get_a_probe() {
        let settings = Settings {
            pod_hostname: "vmaas-websocket-1".to_string(),
            db_available: false,
            ..all_enabled()
        };
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut gate = Gate::new(&settings, recording_factory(log.clone(), 0)).with_sleep(|_| {});

        let report = gate.run().unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["create Reposcan API".to_string(), "check Reposcan API".to_string()]
        );
        assert_eq!(report.skipped, vec![Dependency::Database, Dependency::Websocket]);
        assert_eq!(report.checked, vec![(Dependency::Reposcan, 1)]);
    }

    #[test]
    fn sleeps_use_configured_delay() {
        let settings = Settings {
            retry_delay: Duration::from_millis(40),
            websocket: None,
            reposcan: None,
            ..all_enabled()
        };
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sleeps = Vec::new();
        let mut gate = Gate::new(&settings, recording_factory(log, 4)).with_sleep(|d| sleeps.push(d));

        gate.run().unwrap();
        drop(gate);

        assert_eq!(sleeps, vec![Duration::from_millis(40); 4]);
    }

    #[test]
    fn probe_construction_errors_stop_the_gate() {
        let settings = all_enabled();
        let factory = |_: Dependency| -> Result<Box<dyn Probe>> {
            Err(crate::error::GateError::DatabaseSetup {
                message: "no runtime".into(),
            })
        };
        let mut gate = Gate::new(&settings, factory).with_sleep(|_| {});
        assert!(gate.run().is_err());
    }

    #[test]
    fn live_probes_build_http_probes_for_endpoints() {
        let settings = all_enabled();
        let mut probes = LiveProbes::new(&settings);
        assert!(probes.probe(Dependency::Websocket).is_ok());
        assert!(probes.probe(Dependency::Reposcan).is_ok());
    }

    #[test]
    fn live_probes_reject_missing_endpoint() {
        let settings = Settings::default();
        let mut probes = LiveProbes::new(&settings);
        assert!(probes.probe(Dependency::Reposcan).is_err());
    }

    #[test]
    fn dependency_displays_service_name() {
        assert_eq!(Dependency::Database.to_string(), "PostgreSQL");
        assert_eq!(Dependency::Websocket.to_string(), "Websocket server");
        assert_eq!(Dependency::Reposcan.to_string(), "Reposcan API");
    }
}
