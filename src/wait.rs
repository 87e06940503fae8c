//! The retry loop at the heart of the gate.
//!
//! [`wait_until_ready`] invokes a probe until it reports ready, sleeping a
//! fixed delay after every failed attempt. There is no attempt limit and no
//! backoff growth, and nothing the probe does (an error of either tier, or a
//! panic) escapes the loop. Only a termination signal ends an unsuccessful
//! wait.

use crate::probe::{Probe, ProbeError};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread;
use std::time::Duration;

/// Default sleep between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

thread_local! {
    /// Set while this thread is inside a probe call.
    static IN_PROBE: Cell<bool> = const { Cell::new(false) };
}

static QUIET_PANIC_HOOK: Once = Once::new();

/// Route panics raised inside a probe to the debug log instead of stderr.
/// Panics anywhere else still reach the previously installed hook.
fn install_quiet_panic_hook() {
    QUIET_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_PROBE.with(Cell::get) {
                tracing::debug!("probe panicked: {}", info);
            } else {
                previous(info);
            }
        }));
    });
}

fn check_once<P>(probe: &mut P) -> thread::Result<Result<bool, ProbeError>>
where
    P: Probe + ?Sized,
{
    IN_PROBE.with(|flag| flag.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| probe.check()));
    IN_PROBE.with(|flag| flag.set(false));
    outcome
}

/// Block until `probe` reports ready.
///
/// `service` is only used in log messages. Returns the number of probe
/// invocations it took.
pub fn wait_until_ready<P>(probe: &mut P, service: &str, delay: Duration) -> u64
where
    P: Probe + ?Sized,
{
    wait_until_ready_with(probe, service, delay, std::thread::sleep)
}

/// [`wait_until_ready`] with a caller-supplied sleep function.
pub fn wait_until_ready_with<P, S>(probe: &mut P, service: &str, delay: Duration, mut sleep: S) -> u64
where
    P: Probe + ?Sized,
    S: FnMut(Duration),
{
    install_quiet_panic_hook();
    tracing::info!("Checking if {} is up", service);
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;
        match check_once(probe) {
            Ok(Ok(true)) => {
                tracing::debug!("{} is up after {} attempt(s)", service, attempts);
                return attempts;
            }
            Ok(Ok(false)) => {
                tracing::info!("{} is unavailable - sleeping", service);
            }
            Ok(Err(ProbeError::Unavailable { message, code })) => {
                tracing::info!(
                    "{} is unavailable, error: {}, code: {} - sleeping",
                    service,
                    message,
                    code.as_deref().unwrap_or("none")
                );
            }
            Ok(Err(ProbeError::Other(err))) => {
                tracing::info!("{} is unavailable - sleeping", service);
                tracing::debug!("{} probe failed: {:#}", service, err);
            }
            Err(_) => {
                tracing::info!("{} is unavailable - sleeping", service);
            }
        }
        sleep(delay);
    }
}
