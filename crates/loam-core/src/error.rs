//! Error types for the runtime surface
//!
//! Most marshaling failure modes degrade to defaults by design and never
//! surface here; `RuntimeError` covers contract-level failures at the call
//! boundary only.

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Contract-level runtime errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// A non-function value was invoked
    #[error("attempt to call a {0} value")]
    NotCallable(&'static str),

    /// Error raised by a native function body
    #[error("{0}")]
    Native(String),
}

impl From<String> for RuntimeError {
    fn from(s: String) -> Self {
        RuntimeError::Native(s)
    }
}

impl From<&str> for RuntimeError {
    fn from(s: &str) -> Self {
        RuntimeError::Native(s.to_string())
    }
}
