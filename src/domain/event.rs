//! Event model
//!
//! Telemetry events as delivered by the broker-integration layer, plus the
//! synthetic Maximum-Wait Signal used to force a window-age check on idle
//! partitions. Both travel through the batching engine as an [`IncomingEvent`].

use super::ids::PartitionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single telemetry event read from a partition
///
/// Events are immutable once built; the engine only reads them.
///
/// # Examples
///
/// ```
/// use vitalstream::domain::event::EventMessage;
/// use vitalstream::domain::ids::PartitionId;
/// use chrono::Utc;
///
/// let event = EventMessage::builder()
///     .partition_id(PartitionId::new("0").unwrap())
///     .body(br#"{"heartRate": 72}"#.to_vec())
///     .content_type("application/json")
///     .sequence_number(42)
///     .offset("8400")
///     .enqueued_time(Utc::now())
///     .build()
///     .unwrap();
///
/// assert_eq!(event.sequence_number, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Partition the event was read from
    pub partition_id: PartitionId,

    /// Raw event payload
    pub body: Vec<u8>,

    /// MIME type of the payload, if the producer set one
    pub content_type: Option<String>,

    /// Broker-assigned sequence number, monotonic within a partition
    pub sequence_number: i64,

    /// Opaque broker position token
    pub offset: String,

    /// Time the broker accepted the event
    pub enqueued_time: DateTime<Utc>,

    /// Producer-supplied application properties
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,

    /// Broker-supplied system properties
    #[serde(default)]
    pub system_properties: HashMap<String, serde_json::Value>,
}

impl EventMessage {
    /// Creates a new builder for constructing an EventMessage
    pub fn builder() -> EventMessageBuilder {
        EventMessageBuilder::default()
    }

    /// Payload interpreted as UTF-8, if valid
    pub fn body_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Builder for constructing EventMessage instances
#[derive(Debug, Default)]
pub struct EventMessageBuilder {
    partition_id: Option<PartitionId>,
    body: Vec<u8>,
    content_type: Option<String>,
    sequence_number: i64,
    offset: Option<String>,
    enqueued_time: Option<DateTime<Utc>>,
    properties: HashMap<String, serde_json::Value>,
    system_properties: HashMap<String, serde_json::Value>,
}

impl EventMessageBuilder {
    /// Creates a new EventMessageBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the partition id
    pub fn partition_id(mut self, partition_id: PartitionId) -> Self {
        self.partition_id = Some(partition_id);
        self
    }

    /// Sets the payload
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the sequence number
    pub fn sequence_number(mut self, sequence_number: i64) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    /// Sets the offset; defaults to the sequence number when unset
    pub fn offset(mut self, offset: impl Into<String>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    /// Sets the enqueued time
    pub fn enqueued_time(mut self, enqueued_time: DateTime<Utc>) -> Self {
        self.enqueued_time = Some(enqueued_time);
        self
    }

    /// Adds an application property
    pub fn property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Adds a system property
    pub fn system_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.system_properties.insert(key.into(), value);
        self
    }

    /// Builds the EventMessage
    ///
    /// # Errors
    ///
    /// Returns an error if the partition id or enqueued time is missing
    pub fn build(self) -> Result<EventMessage, String> {
        let partition_id = self.partition_id.ok_or("partition_id is required")?;
        let enqueued_time = self.enqueued_time.ok_or("enqueued_time is required")?;
        let offset = self
            .offset
            .unwrap_or_else(|| self.sequence_number.to_string());

        Ok(EventMessage {
            partition_id,
            body: self.body,
            content_type: self.content_type,
            sequence_number: self.sequence_number,
            offset,
            enqueued_time,
            properties: self.properties,
            system_properties: self.system_properties,
        })
    }
}

/// Synthetic control event forcing a window-age check
///
/// Never delivered downstream and never checkpointed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaximumWaitSignal {
    /// Partition to check
    pub partition_id: PartitionId,

    /// Time the signal was raised
    pub timestamp: DateTime<Utc>,
}

impl MaximumWaitSignal {
    /// Creates a new signal
    pub fn new(partition_id: PartitionId, timestamp: DateTime<Utc>) -> Self {
        Self {
            partition_id,
            timestamp,
        }
    }
}

/// Anything the batching engine accepts from the broker-integration layer
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingEvent {
    /// A telemetry event
    Data(EventMessage),

    /// A maximum-wait control signal
    MaximumWait(MaximumWaitSignal),
}

impl IncomingEvent {
    /// Partition the item belongs to
    pub fn partition_id(&self) -> &PartitionId {
        match self {
            IncomingEvent::Data(event) => &event.partition_id,
            IncomingEvent::MaximumWait(signal) => &signal.partition_id,
        }
    }

    /// Enqueued time for data events, raise time for signals
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            IncomingEvent::Data(event) => event.enqueued_time,
            IncomingEvent::MaximumWait(signal) => signal.timestamp,
        }
    }

    /// Returns true for a maximum-wait signal
    pub fn is_signal(&self) -> bool {
        matches!(self, IncomingEvent::MaximumWait(_))
    }
}

impl From<EventMessage> for IncomingEvent {
    fn from(event: EventMessage) -> Self {
        IncomingEvent::Data(event)
    }
}

impl From<MaximumWaitSignal> for IncomingEvent {
    fn from(signal: MaximumWaitSignal) -> Self {
        IncomingEvent::MaximumWait(signal)
    }
}
