//! Shared utilities for finagent
//!
//! Logging setup and the application-level configuration used by the
//! `finagent` binary.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
