//! Flush policy configuration

use crate::domain::{Result, VitalStreamError};
use chrono::Duration;

/// Default window length in seconds
pub const DEFAULT_FLUSH_TIMESPAN_SECS: u64 = 300;

/// Default queue size that forces a flush
pub const DEFAULT_MAX_EVENTS: usize = 500;

/// Immutable batching policy shared by every partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchingOptions {
    flush_timespan: Duration,
    max_events: usize,
}

impl BatchingOptions {
    /// Create batching options
    ///
    /// # Errors
    ///
    /// Returns a validation error if either value is zero.
    pub fn new(flush_timespan_secs: u64, max_events: usize) -> Result<Self> {
        if flush_timespan_secs == 0 {
            return Err(VitalStreamError::Validation(
                "flush_timespan must be greater than 0 seconds".to_string(),
            ));
        }
        if max_events == 0 {
            return Err(VitalStreamError::Validation(
                "max_events must be greater than 0".to_string(),
            ));
        }
        let secs = i64::try_from(flush_timespan_secs).map_err(|_| {
            VitalStreamError::Validation(format!(
                "flush_timespan of {flush_timespan_secs} seconds is out of range"
            ))
        })?;
        let flush_timespan = Duration::try_seconds(secs).ok_or_else(|| {
            VitalStreamError::Validation(format!(
                "flush_timespan of {flush_timespan_secs} seconds is out of range"
            ))
        })?;

        Ok(Self {
            flush_timespan,
            max_events,
        })
    }

    /// Window length
    pub fn flush_timespan(&self) -> Duration {
        self.flush_timespan
    }

    /// Queue size that forces an immediate flush
    pub fn max_events(&self) -> usize {
        self.max_events
    }
}

impl Default for BatchingOptions {
    fn default() -> Self {
        Self {
            flush_timespan: Duration::seconds(DEFAULT_FLUSH_TIMESPAN_SECS as i64),
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}
