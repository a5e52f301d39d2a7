//! Session context passed through one orchestration run
//!
//! The `SessionContext` carries the session identity, a cancellation signal
//! that the loop checks between iterations, and a small key-value store the
//! agent uses to hand results back to its host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a session and its host
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    /// Create a signal in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Context for one analysis session
///
/// # Example
///
/// ```
/// use finagent_core::SessionContext;
///
/// let mut ctx = SessionContext::with_session_id("s-1");
/// ctx.insert("symbol", serde_json::json!("600519"));
/// assert_eq!(ctx.get("symbol"), Some(&serde_json::json!("600519")));
/// assert!(!ctx.cancellation().is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: String,
    cancellation: CancellationSignal,
    data: HashMap<String, serde_json::Value>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Create a context with a fresh random session id
    pub fn new() -> Self {
        Self::with_session_id(uuid::Uuid::new_v4().to_string())
    }

    /// Create a context with a caller-chosen session id
    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            cancellation: CancellationSignal::new(),
            data: HashMap::new(),
        }
    }

    /// Attach an externally owned cancellation signal
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = signal;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        self.data
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(|e| crate::Error::Internal(format!("Failed to deserialize context value: {e}")))
    }

    /// Insert a typed value into the context
    pub fn insert_typed<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> crate::Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| crate::Error::Internal(format!("Failed to serialize context value: {e}")))?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let signal = CancellationSignal::new();
        let ctx = SessionContext::new().with_cancellation(signal.clone());
        assert!(!ctx.cancellation().is_cancelled());

        signal.cancel();
        assert!(ctx.cancellation().is_cancelled());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(SessionContext::with_session_id("s-1").session_id(), "s-1");
    }

    #[test]
    fn test_insert_overwrites_value() {
        let mut ctx = SessionContext::new();
        assert!(ctx.get("symbol").is_none());

        ctx.insert("symbol", serde_json::json!("600519"));
        ctx.insert("symbol", serde_json::json!("510300"));
        assert_eq!(ctx.get("symbol"), Some(&serde_json::json!("510300")));
    }

    #[test]
    fn test_typed_roundtrip() {
        let mut ctx = SessionContext::new();
        ctx.insert_typed("windows", &vec![5_usize, 20]).unwrap();
        let windows: Vec<usize> = ctx.get_typed("windows").unwrap().unwrap();
        assert_eq!(windows, vec![5, 20]);

        let missing: Option<Vec<usize>> = ctx.get_typed("missing").unwrap();
        assert!(missing.is_none());
    }
}
