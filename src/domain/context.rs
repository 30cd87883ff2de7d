//! Error context extension trait
//!
//! Provides `.context()` and `.with_context()` for `Result<T, E>` where the
//! error converts into [`VitalStreamError`], so library code can annotate
//! failures (which partition, which blob) without switching to `anyhow`.
//!
//! ```rust
//! use vitalstream::domain::Result;
//! use vitalstream::domain::context::ResultExt;
//!
//! fn read_events(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
//! }
//! ```

use crate::domain::errors::VitalStreamError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (evaluated only on error)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<VitalStreamError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Cancellation must stay recognisable after annotation.
fn wrap<C: std::fmt::Display>(base: VitalStreamError, context: C) -> VitalStreamError {
    match base {
        VitalStreamError::Cancelled => VitalStreamError::Cancelled,
        other => VitalStreamError::Other(format!("{context}: {other}")),
    }
}
