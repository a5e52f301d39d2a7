//! Core abstractions for finagent
//!
//! This crate defines the error taxonomy, the session context with its
//! cancellation signal, the `Agent` trait and the retry policy used by every
//! other finagent crate.

pub mod agent;
pub mod context;
pub mod error;
pub mod retry;

pub use agent::Agent;
pub use context::{CancellationSignal, SessionContext};
pub use error::{Error, ErrorKind, Result};
pub use retry::RetryPolicy;
