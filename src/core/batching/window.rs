//! Partition window state
//!
//! One [`PartitionWindow`] exists per active partition. It holds the events
//! buffered since the last flush and the end of the current flush window.
//! Windows are fixed-size and aligned to the first event seen for the
//! partition: advancing moves `window_end` forward in whole multiples of the
//! flush timespan.
//!
//! The window never flushes on its own; the batching service decides when to
//! flush, delivers a prefix of the queue, and only then commits the drain and
//! the window advance.

use crate::domain::{EventMessage, PartitionId};
use chrono::{DateTime, Duration, Utc};

/// Buffered events and window bounds for a single partition
#[derive(Debug)]
pub struct PartitionWindow {
    partition_id: PartitionId,
    queue: Vec<EventMessage>,
    window_end: DateTime<Utc>,
    flush_timespan: Duration,
}

impl PartitionWindow {
    /// Create a window anchored at `first_seen`
    ///
    /// The first window ends exactly one timespan after the anchor.
    pub fn new(partition_id: PartitionId, first_seen: DateTime<Utc>, flush_timespan: Duration) -> Self {
        let window_end = first_seen
            .checked_add_signed(flush_timespan)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            partition_id,
            queue: Vec::new(),
            window_end,
            flush_timespan,
        }
    }

    /// Partition this window belongs to
    pub fn partition_id(&self) -> &PartitionId {
        &self.partition_id
    }

    /// End of the current window
    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    /// Number of buffered events
    pub fn depth(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Buffered events in arrival order
    pub fn queue(&self) -> &[EventMessage] {
        &self.queue
    }

    /// Append an event to the queue
    pub fn enqueue(&mut self, event: EventMessage) {
        debug_assert_eq!(event.partition_id, self.partition_id);
        self.queue.push(event);
    }

    /// True if `timestamp` falls after the current window
    pub fn is_past_window(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp > self.window_end
    }

    /// Window end after advancing past `timestamp` in whole timespans
    ///
    /// The result is always strictly later than `timestamp` and never more
    /// than one timespan beyond it. Returns the current end unchanged when
    /// `timestamp` is still inside the window.
    pub fn next_window_end(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        if timestamp < self.window_end {
            return self.window_end;
        }

        let span_ms = self.flush_timespan.num_milliseconds().max(1);
        let elapsed_ms = (timestamp - self.window_end).num_milliseconds();
        let increments = elapsed_ms / span_ms + 1;

        let mut end = span_ms
            .checked_mul(increments)
            .and_then(Duration::try_milliseconds)
            .and_then(|advance| self.window_end.checked_add_signed(advance))
            .unwrap_or(self.window_end);

        // Sub-millisecond remainders can leave the end on or before the timestamp.
        while end <= timestamp {
            match end.checked_add_signed(self.flush_timespan) {
                Some(next) => end = next,
                None => return DateTime::<Utc>::MAX_UTC,
            }
        }
        end
    }

    /// Remove the first `count` events after they were delivered
    pub fn commit_flush(&mut self, count: usize) {
        let count = count.min(self.queue.len());
        self.queue.drain(..count);
    }

    /// Move the window end forward
    ///
    /// Ends earlier than the current one are ignored.
    pub fn advance_to(&mut self, window_end: DateTime<Utc>) {
        if window_end > self.window_end {
            self.window_end = window_end;
        }
    }
}
