//! Command-line interface for the gate.
//!
//! - [`args`] - Argument definitions using clap derive macros

pub mod args;

pub use args::{parse_seconds, parse_ssl_mode, parse_timeout, Cli};
