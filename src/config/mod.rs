//! Configuration for the gate.
//!
//! Values arrive through the command line or the environment (see
//! [`crate::cli::Cli`]) and are resolved into [`Settings`].

pub mod settings;

pub use settings::{DatabaseSettings, ServiceEndpoint, Settings, HEALTH_PATH};
