use crate::config::ConsumerSettings;
use crate::kafka::config::ConsumerConfig;
use crate::kafka::message::Message;
use crate::kafka::poll::PollOutcome;
use anyhow::Result;
use log::{debug, warn};
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::KafkaResult;
use std::time::Duration;

/// ブローカークライアントとの境界
///
/// 1つのハンドルを複数のスレッドから同時にポーリングしてはならない。
pub trait IConsumer: Send + 'static {
    fn subscribe(&self, topics: &[&str]) -> Result<()>;
    /// 最大`timeout`だけブロックして次のメッセージを待つ。
    fn poll(&self, timeout: Duration) -> PollOutcome;
    /// ハンドルを解放する。所有権を奪うため、解放は一度しか起こらない。
    fn close(self: Box<Self>);
}

pub struct KafkaConsumer {
    base_consumer: BaseConsumer,
}

impl KafkaConsumer {
    pub fn new(base_consumer: BaseConsumer) -> Self {
        Self { base_consumer }
    }

    pub fn connect(settings: &ConsumerSettings) -> KafkaResult<Self> {
        let base_consumer = ConsumerConfig::from_settings(settings).create()?;
        debug!(
            "Created consumer.(brokers={}, group={}, start={})",
            settings.broker_address, settings.group_id, settings.start_position
        );
        Ok(Self::new(base_consumer))
    }
}

impl IConsumer for KafkaConsumer {
    fn subscribe(&self, topics: &[&str]) -> Result<()> {
        self.base_consumer.subscribe(topics)?;
        Ok(())
    }

    fn poll(&self, timeout: Duration) -> PollOutcome {
        let polled = self
            .base_consumer
            .poll(timeout)
            .map(|res| res.map(|msg| Message::from(msg.detach())));
        PollOutcome::from(polled)
    }

    fn close(self: Box<Self>) {
        match self.base_consumer.assignment() {
            Ok(assignment) => debug!("Releasing {} assigned partitions.", assignment.count()),
            Err(e) => warn!("Failed to read assignment before close.({})", e),
        }
        self.base_consumer.unsubscribe();
        // NOTE: The native handle is closed (and offsets committed) when the consumer is dropped.
    }
}
