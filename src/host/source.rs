//! JSON-lines replay source
//!
//! Reads one event record per line and fans the events out to one
//! [`PartitionPump`] per partition. The record layout matches what
//! [`JsonlFileConsumer`](crate::adapters::consumers::JsonlFileConsumer)
//! writes, so a captured stream can be replayed:
//!
//! ```json
//! {"partition_id":"0","sequence_number":17,"enqueued_time":"2025-03-01T12:00:00Z","body":{"heartRate":72}}
//! ```

use super::pump::{PartitionPump, PumpSummary};
use crate::core::batching::EventBatchingService;
use crate::core::lifecycle::PartitionLifecycleNotifier;
use crate::domain::context::ResultExt;
use crate::domain::{EventMessage, PartitionId, Result, VitalStreamError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const PUMP_CHANNEL_CAPACITY: usize = 256;

/// One line of a replay file
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRecord {
    pub partition_id: PartitionId,
    pub sequence_number: i64,
    #[serde(default)]
    pub offset: Option<String>,
    pub enqueued_time: DateTime<Utc>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Strings are sent as UTF-8, any other JSON value as its serialized text
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl ReplayRecord {
    pub fn into_event(self) -> Result<EventMessage> {
        let body = match self.body {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::String(text) => text.into_bytes(),
            other => serde_json::to_vec(&other)?,
        };

        let mut builder = EventMessage::builder()
            .partition_id(self.partition_id)
            .sequence_number(self.sequence_number)
            .enqueued_time(self.enqueued_time)
            .body(body);
        if let Some(offset) = self.offset {
            builder = builder.offset(offset);
        }
        if let Some(content_type) = self.content_type {
            builder = builder.content_type(content_type);
        }
        for (key, value) in self.properties {
            builder = builder.property(key, value);
        }

        builder.build().map_err(VitalStreamError::Validation)
    }
}

/// Per-partition results of a replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// Sorted by partition id
    pub partitions: Vec<PumpSummary>,
}

impl ReplayReport {
    pub fn total_events(&self) -> u64 {
        self.partitions.iter().map(|p| p.events).sum()
    }

    pub fn total_flushed(&self) -> u64 {
        self.partitions.iter().map(PumpSummary::flushed).sum()
    }

    pub fn total_buffered(&self) -> usize {
        self.partitions.iter().map(|p| p.buffered).sum()
    }
}

/// Replays a JSON-lines file through the batching engine
pub struct ReplaySource {
    batching: Arc<EventBatchingService>,
    lifecycle: Arc<PartitionLifecycleNotifier>,
    max_wait: Duration,
}

impl ReplaySource {
    pub fn new(
        batching: Arc<EventBatchingService>,
        lifecycle: Arc<PartitionLifecycleNotifier>,
        max_wait: Duration,
    ) -> Self {
        Self {
            batching,
            lifecycle,
            max_wait,
        }
    }

    /// Replay every record in `path`
    ///
    /// Stale checkpoints are reset before the first event. Blank lines are
    /// ignored; a malformed line aborts the replay. Events still buffered when
    /// the file ends are reported, not flushed.
    ///
    /// # Errors
    ///
    /// Returns the first pump failure, or a validation error naming the line
    /// that could not be parsed.
    pub async fn replay_file(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<ReplayReport> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open replay file {}", path.display()))?;

        let deleted = self.lifecycle.initialize().await?;
        tracing::info!(
            path = %path.display(),
            deleted_checkpoints = deleted,
            "Starting replay"
        );

        let pump_cancel = cancel.child_token();
        let mut senders: HashMap<PartitionId, mpsc::Sender<EventMessage>> = HashMap::new();
        let mut pumps = JoinSet::new();
        let mut lines = BufReader::new(file).lines();
        let mut line_number = 0usize;

        let read_result = async {
            while let Some(line) = lines.next_line().await? {
                line_number += 1;
                if cancel.is_cancelled() {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }

                let record: ReplayRecord = serde_json::from_str(&line).map_err(|e| {
                    VitalStreamError::Validation(format!(
                        "{}:{line_number}: invalid event record: {e}",
                        path.display()
                    ))
                })?;
                let event = record.into_event()?;

                let sender = senders
                    .entry(event.partition_id.clone())
                    .or_insert_with(|| {
                        let (tx, rx) = mpsc::channel(PUMP_CHANNEL_CAPACITY);
                        let pump = PartitionPump::new(
                            event.partition_id.clone(),
                            self.batching.clone(),
                            self.lifecycle.clone(),
                            self.max_wait,
                        );
                        pumps.spawn(pump.run(rx, pump_cancel.clone()));
                        tx
                    });

                // A closed channel means the pump failed; its error is collected below.
                if sender.send(event).await.is_err() {
                    tracing::warn!(line = line_number, "Partition pump stopped early; ending replay");
                    break;
                }
            }
            Ok::<(), VitalStreamError>(())
        }
        .await;

        if read_result.is_err() {
            pump_cancel.cancel();
        }
        drop(senders);

        let mut report = ReplayReport::default();
        let mut first_error: Option<VitalStreamError> = None;
        while let Some(joined) = pumps.join_next().await {
            let outcome = joined
                .map_err(|e| VitalStreamError::Other(format!("Partition pump panicked: {e}")))
                .and_then(|result| result);
            match outcome {
                Ok(summary) => report.partitions.push(summary),
                Err(error) => {
                    pump_cancel.cancel();
                    first_error.get_or_insert(error);
                }
            }
        }
        report
            .partitions
            .sort_by(|a, b| a.partition_id.cmp(&b.partition_id));

        read_result?;
        if let Some(error) = first_error {
            return Err(error);
        }

        tracing::info!(
            partitions = report.partitions.len(),
            events = report.total_events(),
            flushed = report.total_flushed(),
            buffered = report.total_buffered(),
            "Replay finished"
        );
        Ok(report)
    }
}
