//! Fan-out delivery to downstream consumers
//!
//! Every registered consumer receives the full batch. Consumers run
//! concurrently and retry independently, so one consumer exhausting its
//! retries never stops another from succeeding. The call completes only once
//! every consumer has either succeeded or given up.

use super::retry::RetryPolicy;
use super::EventConsumer;
use crate::domain::{ConsumerError, ConsumerFailure, EventMessage, Result, VitalStreamError};
use crate::log_retry_attempt;
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

enum DeliveryFailure {
    Cancelled,
    Exhausted(ConsumerFailure),
}

/// Delivers batches to a set of consumers with bounded retry
pub struct EventConsumerService {
    consumers: Vec<Arc<dyn EventConsumer>>,
    retry_policy: RetryPolicy,
}

impl EventConsumerService {
    /// Create a service over `consumers`
    pub fn new(consumers: Vec<Arc<dyn EventConsumer>>, retry_policy: RetryPolicy) -> Self {
        Self {
            consumers,
            retry_policy,
        }
    }

    /// Registered consumer names in registration order
    pub fn consumer_names(&self) -> Vec<&str> {
        self.consumers.iter().map(|c| c.name()).collect()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Deliver `events` to every consumer
    ///
    /// An empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// - [`VitalStreamError::Cancelled`] if `cancel` fires or a consumer reports
    ///   cancellation; cancellation is never retried.
    /// - [`ConsumerError::Aggregate`] listing every consumer that failed all of
    ///   its attempts.
    pub async fn consume_events(
        &self,
        events: &[EventMessage],
        cancel: &CancellationToken,
    ) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(VitalStreamError::Cancelled);
        }

        let outcomes = join_all(
            self.consumers
                .iter()
                .map(|consumer| self.consume_with_retry(consumer.as_ref(), events, cancel)),
        )
        .await;

        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(()) => {}
                Err(DeliveryFailure::Cancelled) => return Err(VitalStreamError::Cancelled),
                Err(DeliveryFailure::Exhausted(failure)) => failures.push(failure),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConsumerError::Aggregate(failures).into())
        }
    }

    async fn consume_with_retry(
        &self,
        consumer: &dyn EventConsumer,
        events: &[EventMessage],
        cancel: &CancellationToken,
    ) -> std::result::Result<(), DeliveryFailure> {
        let max_attempts = self.retry_policy.max_attempts();
        let mut errors: Vec<String> = Vec::new();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DeliveryFailure::Cancelled),
                result = consumer.consume(events) => result,
            };

            let error = match result {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(
                            consumer = consumer.name(),
                            attempts = attempt,
                            "Consumer succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(e) if e.is_cancelled() => return Err(DeliveryFailure::Cancelled),
                Err(e) => e,
            };

            errors.push(error.to_string());

            if attempt >= max_attempts {
                tracing::error!(
                    consumer = consumer.name(),
                    attempts = attempt,
                    batch_size = events.len(),
                    errors = ?errors,
                    "Consumer failed after exhausting retries"
                );
                return Err(DeliveryFailure::Exhausted(ConsumerFailure {
                    consumer: consumer.name().to_string(),
                    attempts: attempt,
                    last_error: error.to_string(),
                }));
            }

            log_retry_attempt!(consumer.name(), attempt, max_attempts, &error);

            let delay = self.retry_policy.delay_for(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(DeliveryFailure::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PartitionId;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FlakyConsumer {
        name: String,
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    impl FlakyConsumer {
        fn new(name: &str, failures_before_success: usize) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failures_before_success,
                calls: AtomicUsize::new(0),
            })
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

        async fn consume(&self, _events: &[EventMessage]) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                Err(ConsumerError::failed(&self.name, format!("failure {call}")).into())
            } else {
                Ok(())
            }
        }
    }

    struct CancellingConsumer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventConsumer for CancellingConsumer {
        fn name(&self) -> &str {
            "cancelling"
        }

        async fn consume(&self, _events: &[EventMessage]) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VitalStreamError::Cancelled)
        }
    }

    fn batch() -> Vec<EventMessage> {
        vec![EventMessage::builder()
            .partition_id(PartitionId::new("0").unwrap())
            .sequence_number(1)
            .enqueued_time(Utc::now())
            .build()
            .unwrap()]
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let consumer = FlakyConsumer::new("flaky", 3);
        let service = EventConsumerService::new(vec![consumer.clone()], RetryPolicy::immediate(3));

        service
            .consume_events(&batch(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(consumer.calls(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_consumer_reported_in_aggregate() {
        let healthy = FlakyConsumer::new("healthy", 0);
        let broken = FlakyConsumer::new("broken", usize::MAX);
        let service = EventConsumerService::new(
            vec![broken.clone(), healthy.clone()],
            RetryPolicy::immediate(2),
        );

        let err = service
            .consume_events(&batch(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            VitalStreamError::Consumer(ConsumerError::Aggregate(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].consumer, "broken");
                assert_eq!(failures[0].attempts, 3);
                assert!(failures[0].last_error.contains("failure 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(broken.calls(), 3);
        assert_eq!(healthy.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_consumers() {
        let consumer = FlakyConsumer::new("idle", 0);
        let service = EventConsumerService::new(vec![consumer.clone()], RetryPolicy::default());

        service
            .consume_events(&[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(consumer.calls(), 0);
    }

    #[tokio::test]
    async fn test_consumer_cancellation_is_not_retried() {
        let consumer = Arc::new(CancellingConsumer {
            calls: AtomicUsize::new(0),
        });
        let service = EventConsumerService::new(vec![consumer.clone()], RetryPolicy::immediate(3));

        let err = service
            .consume_events(&batch(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(consumer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let consumer = FlakyConsumer::new("slow", usize::MAX);
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 1.0,
        };
        let service = EventConsumerService::new(vec![consumer.clone()], policy);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = service.consume_events(&batch(), &cancel).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(consumer.calls(), 1);
    }
}
