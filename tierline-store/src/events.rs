use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tierline_core::{BoxError, EventSink};
use tierline_shared::models::events::DomainEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

/// Anything the forwarder can hand serialized events to.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<(), BoxError>;
}

#[async_trait]
impl EventPublisher for EventProducer {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<(), BoxError> {
        self.publish(topic, key, payload).await?;
        Ok(())
    }
}

/// Enqueues events on an unbounded channel; a forwarder task drains it.
#[derive(Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn dispatch(&self, event: DomainEvent) {
        debug!("Queueing {} event", event.event_type());
        if let Err(e) = self.tx.send(event) {
            warn!("Event channel closed, dropping {} event", e.0.event_type());
        }
    }
}

/// Publish every queued event as JSON, keyed by its aggregate id. Runs until
/// all senders are dropped. Publish failures are logged and skipped.
pub fn spawn_event_forwarder<P>(
    mut rx: mpsc::UnboundedReceiver<DomainEvent>,
    publisher: P,
    topic: String,
) -> JoinHandle<()>
where
    P: EventPublisher + 'static,
{
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to serialize {} event: {}", event.event_type(), e);
                    continue;
                }
            };

            if let Err(e) = publisher.send(&topic, &event.key(), &payload).await {
                error!("Failed to forward {} event: {}", event.event_type(), e);
            }
        }
        info!("Event channel closed, forwarder stopping");
    })
}
