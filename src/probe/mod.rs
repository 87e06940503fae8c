//! Readiness probes.
//!
//! A [`Probe`] performs one readiness check against a dependency. It reports
//! "ready" or "not yet" as a `bool`, or fails with a [`ProbeError`]. Errors
//! are classified in two tiers:
//!
//! - [`ProbeError::Unavailable`] - a known-transient condition (the service is
//!   still starting), carrying whatever diagnostic fields the driver reported
//! - [`ProbeError::Other`] - anything else
//!
//! Both tiers are retried the same way by [`wait_until_ready`]; the tier only
//! decides what gets logged.
//!
//! Any closure returning `Result<T, ProbeError>` where `T: Ready` is a probe,
//! so ad-hoc checks need no wrapper type:
//!
//! ```
//! use wait_for_services::probe::{Probe, ProbeError};
//!
//! let mut calls = 0;
//! let mut probe = || -> Result<usize, ProbeError> {
//!     calls += 1;
//!     Ok(calls - 1)
//! };
//! assert!(!probe.check().unwrap()); // 0 is not ready
//! assert!(probe.check().unwrap()); // 1 is ready
//! ```
//!
//! [`wait_until_ready`]: crate::wait::wait_until_ready

pub mod database;
pub mod http;

pub use database::DatabaseProbe;
pub use http::HttpHealthProbe;

use thiserror::Error;

/// Failure of a single probe invocation.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The dependency is known to be temporarily unavailable.
    #[error("{message}")]
    Unavailable {
        /// Human-readable diagnostic from the driver or transport.
        message: String,
        /// Machine-readable code (e.g. a SQLSTATE), when one was reported.
        code: Option<String>,
    },

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProbeError {
    /// Create a transient failure without a code.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            code: None,
        }
    }

    /// Create a transient failure carrying a driver code.
    pub fn unavailable_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Whether this failure was classified as known-transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// One readiness check against a dependency.
pub trait Probe {
    /// Run the check once. `Ok(true)` means the dependency is ready.
    fn check(&mut self) -> Result<bool, ProbeError>;
}

impl<F, T> Probe for F
where
    F: FnMut() -> Result<T, ProbeError>,
    T: Ready,
{
    fn check(&mut self) -> Result<bool, ProbeError> {
        self().map(|value| value.is_ready())
    }
}

/// Truthiness of a probe result.
///
/// Zero, empty and absent values are "not ready"; everything else is ready.
pub trait Ready {
    /// Whether this value signals a ready dependency.
    fn is_ready(&self) -> bool;
}

impl Ready for bool {
    fn is_ready(&self) -> bool {
        *self
    }
}

/// Returning without an error is success.
impl Ready for () {
    fn is_ready(&self) -> bool {
        true
    }
}

macro_rules! ready_when_nonzero {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Ready for $ty {
                fn is_ready(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

ready_when_nonzero!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Ready for f64 {
    fn is_ready(&self) -> bool {
        *self != 0.0
    }
}

impl Ready for str {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }
}

impl Ready for String {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Ready for Vec<T> {
    fn is_ready(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Ready> Ready for Option<T> {
    fn is_ready(&self) -> bool {
        self.as_ref().is_some_and(Ready::is_ready)
    }
}

impl<T: Ready + ?Sized> Ready for &T {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_map_directly() {
        assert!(true.is_ready());
        assert!(!false.is_ready());
    }

    #[test]
    fn unit_is_ready() {
        assert!(().is_ready());
    }

    #[test]
    fn zero_is_not_ready() {
        assert!(!0i32.is_ready());
        assert!(!0u64.is_ready());
        assert!(!0.0f64.is_ready());
    }

    #[test]
    fn nonzero_is_ready() {
        assert!(1i32.is_ready());
        assert!((-3i64).is_ready());
        assert!(0.5f64.is_ready());
    }

    #[test]
    fn strings_ready_when_non_empty() {
        assert!("up".is_ready());
        assert!(!"".is_ready());
        assert!(String::from("ok").is_ready());
        assert!(!String::new().is_ready());
    }

    #[test]
    fn collections_ready_when_non_empty() {
        assert!(vec![1].is_ready());
        assert!(!Vec::<u8>::new().is_ready());
    }

    #[test]
    fn options_follow_inner_value() {
        assert!(Some(true).is_ready());
        assert!(!Some(false).is_ready());
        assert!(!None::<bool>.is_ready());
    }

    #[test]
    fn closure_probe_maps_truthiness() {
        let mut probe = || -> Result<&'static str, ProbeError> { Ok("") };
        assert!(!probe.check().unwrap());

        let mut probe = || -> Result<&'static str, ProbeError> { Ok("healthy") };
        assert!(probe.check().unwrap());
    }

    #[test]
    fn closure_probe_passes_errors_through() {
        let mut probe = || -> Result<bool, ProbeError> { Err(ProbeError::unavailable("refused")) };
        let err = probe.check().unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn unavailable_with_code_keeps_code() {
        let err = ProbeError::unavailable_with_code("starting up", "57P03");
        match err {
            ProbeError::Unavailable { message, code } => {
                assert_eq!(message, "starting up");
                assert_eq!(code.as_deref(), Some("57P03"));
            }
            ProbeError::Other(_) => panic!("expected transient error"),
        }
    }

    #[test]
    fn other_errors_are_not_transient() {
        let err: ProbeError = anyhow::anyhow!("bad state").into();
        assert!(!err.is_transient());
    }
}
