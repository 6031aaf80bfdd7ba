//! RabbitMQ exerciser.
//!
//! A producer task publishes empty messages and a consumer task takes one
//! delivery per published message. They share one AMQP connection but use
//! separate channels.
//!
//! ```text
//! producer ──publish──▶ queue ──deliver──▶ consumer
//!     │                                       │
//!     └──── handoff(taken) ──▶ ... ──taken────┘
//!
//! either task ──▶ errors ─┐
//! consumer    ──▶ done ───┴─▶ select (first error wins)
//! ```
//!
//! Every publish is followed by a handoff carrying a `taken` sender, and the
//! producer does not publish again until the consumer has completed it. The
//! producer is therefore never more than one message ahead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};
use tokio::sync::{mpsc, oneshot};

use crate::config::BackendKind;
use crate::exercise::{Budget, ExerciseError, Exerciser, LOAD_TARGET};

/// Producer side of a relay.
pub(crate) trait Publish: Send + 'static {
    fn publish(&mut self) -> BoxFuture<'_, Result<(), ExerciseError>>;
}

/// Consumer side of a relay: wait for exactly one delivery.
pub(crate) trait Take: Send + 'static {
    fn take(&mut self) -> BoxFuture<'_, Result<(), ExerciseError>>;
}

pub struct RabbitExerciser {
    url: String,
    teardown: bool,
}

impl RabbitExerciser {
    pub fn new(url: impl Into<String>, teardown: bool) -> Self {
        Self {
            url: url.into(),
            teardown,
        }
    }

    async fn exercise(&self, budget: Arc<Budget>) -> Result<u64, ExerciseError> {
        let conn = Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let result = self.exercise_on(&conn, budget).await;

        if let Err(e) = conn.close(200, "OK").await {
            tracing::debug!(error = %e, "Failed to close AMQP connection cleanly");
        }
        result
    }

    async fn exercise_on(&self, conn: &Connection, budget: Arc<Budget>) -> Result<u64, ExerciseError> {
        let producer_channel = conn.create_channel().await?;
        let consumer_channel = conn.create_channel().await?;
        declare_queue(&producer_channel).await?;

        let consumer = consumer_channel
            .basic_consume(
                LOAD_TARGET,
                "",
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        let published = relay(
            AmqpPublisher {
                channel: producer_channel,
            },
            AmqpTaker { consumer },
            budget,
        )
        .await?;

        if self.teardown {
            let channel = conn.create_channel().await?;
            channel
                .queue_delete(LOAD_TARGET, QueueDeleteOptions::default())
                .await?;
        }

        Ok(published)
    }
}

impl Exerciser for RabbitExerciser {
    fn kind(&self) -> BackendKind {
        BackendKind::Rabbitmq
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(self.exercise(budget))
    }
}

async fn declare_queue(channel: &Channel) -> Result<(), ExerciseError> {
    channel
        .queue_declare(
            LOAD_TARGET,
            QueueDeclareOptions {
                auto_delete: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;
    Ok(())
}

struct AmqpPublisher {
    channel: Channel,
}

impl Publish for AmqpPublisher {
    fn publish(&mut self) -> BoxFuture<'_, Result<(), ExerciseError>> {
        Box::pin(async move {
            self.channel
                .basic_publish(
                    "",
                    LOAD_TARGET,
                    BasicPublishOptions::default(),
                    &[],
                    BasicProperties::default().with_content_type("text/plain".into()),
                )
                .await?
                .await?;
            Ok(())
        })
    }
}

struct AmqpTaker {
    consumer: Consumer,
}

impl Take for AmqpTaker {
    fn take(&mut self) -> BoxFuture<'_, Result<(), ExerciseError>> {
        Box::pin(async move {
            match self.consumer.next().await {
                Some(delivery) => {
                    delivery?;
                    Ok(())
                }
                None => Err(ExerciseError::Worker("amqp consumer closed".into())),
            }
        })
    }
}

/// Run `publisher` and `taker` in lock step until `budget` is spent.
///
/// Returns the number of messages published, or the first error either
/// side reported.
pub(crate) async fn relay<P: Publish, T: Take>(
    publisher: P,
    taker: T,
    budget: Arc<Budget>,
) -> Result<u64, ExerciseError> {
    let (handoff_tx, handoff_rx) = mpsc::channel::<oneshot::Sender<()>>(1);
    let (error_tx, mut error_rx) = mpsc::channel::<ExerciseError>(2);
    let (done_tx, done_rx) = oneshot::channel::<()>();
    let published = Arc::new(AtomicU64::new(0));

    tokio::spawn(produce(
        publisher,
        budget,
        handoff_tx,
        error_tx.clone(),
        Arc::clone(&published),
    ));
    tokio::spawn(consume(taker, handoff_rx, error_tx, done_tx));

    tokio::select! {
        biased;
        Some(err) = error_rx.recv() => Err(err),
        _ = done_rx => Ok(published.load(Ordering::SeqCst)),
    }
}

async fn produce<P: Publish>(
    mut publisher: P,
    budget: Arc<Budget>,
    handoff: mpsc::Sender<oneshot::Sender<()>>,
    errors: mpsc::Sender<ExerciseError>,
    published: Arc<AtomicU64>,
) {
    let mut sent = 0;
    while budget.allows(sent) {
        if let Err(e) = publisher.publish().await {
            let _ = errors.send(e).await;
            return;
        }
        sent += 1;
        published.store(sent, Ordering::SeqCst);

        let (taken_tx, taken_rx) = oneshot::channel();
        if handoff.send(taken_tx).await.is_err() || taken_rx.await.is_err() {
            // Consumer already stopped and reported why.
            return;
        }
    }
    // Dropping `handoff` here ends the consumer loop.
}

async fn consume<T: Take>(
    mut taker: T,
    mut handoff: mpsc::Receiver<oneshot::Sender<()>>,
    errors: mpsc::Sender<ExerciseError>,
    done: oneshot::Sender<()>,
) {
    while let Some(taken) = handoff.recv().await {
        if let Err(e) = taker.take().await {
            let _ = errors.send(e).await;
            return;
        }
        let _ = taken.send(());
    }
    let _ = done.send(());
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shared view of both sides of a relay.
    #[derive(Default)]
    struct Ledger {
        published: AtomicU64,
        taken: AtomicU64,
        max_lead: AtomicU64,
    }

    struct FakePublisher {
        ledger: Arc<Ledger>,
        fail_on: Option<u64>,
    }

    impl Publish for FakePublisher {
        fn publish(&mut self) -> BoxFuture<'_, Result<(), ExerciseError>> {
            Box::pin(async move {
                let attempt = self.ledger.published.load(Ordering::SeqCst) + 1;
                if self.fail_on == Some(attempt) {
                    return Err(ExerciseError::Worker("publish refused".into()));
                }
                tokio::task::yield_now().await;
                let published = self.ledger.published.fetch_add(1, Ordering::SeqCst) + 1;
                let lead = published - self.ledger.taken.load(Ordering::SeqCst);
                self.ledger.max_lead.fetch_max(lead, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    struct FakeTaker {
        ledger: Arc<Ledger>,
        fail_on: Option<u64>,
    }

    impl Take for FakeTaker {
        fn take(&mut self) -> BoxFuture<'_, Result<(), ExerciseError>> {
            Box::pin(async move {
                tokio::task::yield_now().await;
                let attempt = self.ledger.taken.load(Ordering::SeqCst) + 1;
                if self.fail_on == Some(attempt) {
                    return Err(ExerciseError::Worker("delivery lost".into()));
                }
                self.ledger.taken.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    async fn run_relay(
        iterations: u64,
        publish_fails_on: Option<u64>,
        take_fails_on: Option<u64>,
    ) -> (Result<u64, ExerciseError>, Arc<Ledger>) {
        let ledger = Arc::new(Ledger::default());
        let result = relay(
            FakePublisher {
                ledger: Arc::clone(&ledger),
                fail_on: publish_fails_on,
            },
            FakeTaker {
                ledger: Arc::clone(&ledger),
                fail_on: take_fails_on,
            },
            Arc::new(Budget::Iterations(iterations)),
        )
        .await;
        (result, ledger)
    }

    #[tokio::test]
    async fn count_matches_messages_published_and_taken() {
        let (result, ledger) = run_relay(25, None, None).await;

        assert_eq!(result.unwrap(), 25);
        assert_eq!(ledger.published.load(Ordering::SeqCst), 25);
        assert_eq!(ledger.taken.load(Ordering::SeqCst), 25);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn producer_never_runs_more_than_one_ahead() {
        let (result, ledger) = run_relay(200, None, None).await;

        assert_eq!(result.unwrap(), 200);
        assert_eq!(ledger.max_lead.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn consumer_error_stops_the_producer() {
        let (result, ledger) = run_relay(100, None, Some(3)).await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "worker: delivery lost");
        assert_eq!(ledger.taken.load(Ordering::SeqCst), 2);

        // Give the producer a chance to misbehave before checking.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(ledger.published.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn producer_error_wins_over_consumer_completion() {
        let (result, ledger) = run_relay(100, Some(2), None).await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "worker: publish refused");
        assert_eq!(ledger.published.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.taken.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_budget_completes_without_publishing() {
        let (result, ledger) = run_relay(0, None, None).await;

        assert_eq!(result.unwrap(), 0);
        assert_eq!(ledger.published.load(Ordering::SeqCst), 0);
    }
}
