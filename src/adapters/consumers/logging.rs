//! Consumer that logs batch summaries

use crate::core::consumer::EventConsumer;
use crate::domain::{EventMessage, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Logs one structured line per delivered batch
#[derive(Debug)]
pub struct LoggingConsumer {
    name: String,
    batches: AtomicU64,
    events: AtomicU64,
}

impl LoggingConsumer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: AtomicU64::new(0),
            events: AtomicU64::new(0),
        }
    }

    /// Batches received so far
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Events received so far
    pub fn events(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventConsumer for LoggingConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume(&self, events: &[EventMessage]) -> Result<()> {
        let (Some(first), Some(last)) = (events.first(), events.last()) else {
            return Ok(());
        };

        self.batches.fetch_add(1, Ordering::Relaxed);
        self.events.fetch_add(events.len() as u64, Ordering::Relaxed);

        tracing::info!(
            consumer = %self.name,
            partition_id = %first.partition_id,
            batch_size = events.len(),
            first_sequence_number = first.sequence_number,
            last_sequence_number = last.sequence_number,
            first_enqueued_time = %first.enqueued_time,
            last_enqueued_time = %last.enqueued_time,
            "Received batch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PartitionId;
    use chrono::Utc;

    #[tokio::test]
    async fn test_counts_batches_and_events() {
        let consumer = LoggingConsumer::new("log");
        let events: Vec<EventMessage> = (1..=3)
            .map(|seq| {
                EventMessage::builder()
                    .partition_id(PartitionId::new("0").unwrap())
                    .sequence_number(seq)
                    .enqueued_time(Utc::now())
                    .build()
                    .unwrap()
            })
            .collect();

        consumer.consume(&events).await.unwrap();
        consumer.consume(&[]).await.unwrap();

        assert_eq!(consumer.batches(), 1);
        assert_eq!(consumer.events(), 3);
    }
}
