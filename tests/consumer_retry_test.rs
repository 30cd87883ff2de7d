//! Integration tests for consumer fan-out and retry

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;
use vitalstream::adapters::blob::InMemoryBlobStore;
use vitalstream::core::batching::{BatchingOptions, EventBatchingService};
use vitalstream::core::checkpoint::{CheckpointClient, SourceIdentity, StorageCheckpointClient};
use vitalstream::core::consumer::{EventConsumer, EventConsumerService, RetryPolicy};
use vitalstream::domain::{ConsumerError, EventMessage, PartitionId, Result, VitalStreamError};

/// Fails its first `failures` invocations, then succeeds
struct FlakyConsumer {
    name: String,
    failures: usize,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<i64>>>,
}

impl FlakyConsumer {
    fn new(name: &str, failures: usize) -> Self {
        Self {
            name: name.to_string(),
            failures,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventConsumer for FlakyConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn consume(&self, events: &[EventMessage]) -> Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push(events.iter().map(|e| e.sequence_number).collect());
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(VitalStreamError::Other(format!("{} attempt {call} failed", self.name)));
        }
        Ok(())
    }
}

fn events(count: i64) -> Vec<EventMessage> {
    let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|seq| {
            EventMessage::builder()
                .partition_id(PartitionId::new("0").unwrap())
                .sequence_number(seq)
                .enqueued_time(start + Duration::seconds(seq))
                .build()
                .unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_consumer_succeeding_on_fourth_attempt() {
    let flaky = Arc::new(FlakyConsumer::new("flaky", 3));
    let service = EventConsumerService::new(
        vec![flaky.clone() as Arc<dyn EventConsumer>],
        RetryPolicy::immediate(3),
    );

    service
        .consume_events(&events(3), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(flaky.calls(), 4);
    // Every attempt sees the same batch in the same order.
    let seen = flaky.seen.lock().unwrap();
    assert!(seen.iter().all(|batch| *batch == vec![0, 1, 2]));
}

#[tokio::test]
async fn test_exhausted_consumer_reported_in_aggregate() {
    let healthy = Arc::new(FlakyConsumer::new("healthy", 0));
    let broken = Arc::new(FlakyConsumer::new("broken", usize::MAX));
    let service = EventConsumerService::new(
        vec![
            healthy.clone() as Arc<dyn EventConsumer>,
            broken.clone() as Arc<dyn EventConsumer>,
        ],
        RetryPolicy::immediate(2),
    );

    let err = service
        .consume_events(&events(1), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(healthy.calls(), 1);
    assert_eq!(broken.calls(), 3);
    match err {
        VitalStreamError::Consumer(ConsumerError::Aggregate(failures)) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].consumer, "broken");
            assert_eq!(failures[0].attempts, 3);
            assert!(failures[0].last_error.contains("attempt 3"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_backoff_is_interrupted_by_cancellation() {
    let broken = Arc::new(FlakyConsumer::new("broken", usize::MAX));
    let policy = RetryPolicy {
        max_retries: 5,
        initial_delay: StdDuration::from_secs(30),
        max_delay: StdDuration::from_secs(30),
        backoff_multiplier: 1.0,
    };
    let service = Arc::new(EventConsumerService::new(
        vec![broken.clone() as Arc<dyn EventConsumer>],
        policy,
    ));
    let cancel = CancellationToken::new();

    let task = {
        let service = service.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { service.consume_events(&events(1), &cancel).await })
    };

    tokio::time::sleep(StdDuration::from_millis(50)).await;
    cancel.cancel();

    let err = tokio::time::timeout(StdDuration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(broken.calls(), 1);
}

#[tokio::test]
async fn test_engine_checkpoints_after_retried_delivery() {
    let flaky = Arc::new(FlakyConsumer::new("flaky", 3));
    let checkpoints = Arc::new(StorageCheckpointClient::new(
        Arc::new(InMemoryBlobStore::new()),
        "vitalstream",
        SourceIdentity::new("ns.servicebus.windows.net", "vitals", "").unwrap(),
        1,
    ));
    let engine = EventBatchingService::new(
        BatchingOptions::new(300, 2).unwrap(),
        Arc::new(EventConsumerService::new(
            vec![flaky.clone() as Arc<dyn EventConsumer>],
            RetryPolicy::immediate(3),
        )),
        checkpoints.clone(),
    );

    let cancel = CancellationToken::new();
    for event in events(2) {
        engine.consume_event(event.into(), &cancel).await.unwrap();
    }

    assert_eq!(flaky.calls(), 4);
    let stored = checkpoints
        .get_checkpoint(&PartitionId::new("0").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.sequence_number, 1);
}
